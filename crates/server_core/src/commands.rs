//! Command surface: `equip`, `unequip`, `give`, `remove`, `list`, `info`,
//! `reload`. Parsing is separate from execution so hosts can plug in their
//! own dispatcher; replies are typed and render through `Display`.

use std::fmt;

use thiserror::Error;

use crate::CompanionServer;
use crate::companion::Rarity;
use crate::gateway::WorldGateway;
use crate::lifecycle::EquipError;
use crate::owner::{OwnerDirectory, OwnerId};
use crate::store::OwnershipStore;

pub const ADMIN_PERMISSION: &str = "companions.admin";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Equip { id: String },
    Unequip,
    Give { player: String, id: String },
    Remove { player: String, id: String },
    List,
    Info,
    Reload,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing subcommand")]
    Empty,
    #[error("unknown subcommand '{0}'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

impl Command {
    pub fn parse<I, T>(args: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let Some((sub, rest)) = args.split_first() else {
            return Err(ParseError::Empty);
        };
        let cmd = match (sub.to_ascii_lowercase().as_str(), rest) {
            ("equip", [id]) => Self::Equip { id: id.clone() },
            ("equip", _) => return Err(ParseError::Usage("equip <id>")),
            ("unequip", []) => Self::Unequip,
            ("give", [player, id]) => Self::Give { player: player.clone(), id: id.clone() },
            ("give", _) => return Err(ParseError::Usage("give <player> <id>")),
            ("remove", [player, id]) => Self::Remove { player: player.clone(), id: id.clone() },
            ("remove", _) => return Err(ParseError::Usage("remove <player> <id>")),
            ("list", []) => Self::List,
            ("info", []) => Self::Info,
            ("reload", []) => Self::Reload,
            ("unequip" | "list" | "info" | "reload", _) => return Err(ParseError::Usage("takes no arguments")),
            (other, _) => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(cmd)
    }

    fn needs_admin(&self) -> bool {
        matches!(self, Self::Give { .. } | Self::Remove { .. } | Self::Reload)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommandSender {
    Owner(OwnerId),
    Console,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    OnlyOwners,
    NoPermission,
    PlayerNotFound(String),
    UnknownCompanion(String),
    Equipped(String),
    EquipFailed(String),
    Unequipped,
    Given { player: String, id: String },
    Removed { player: String, id: String },
    List(Vec<ListEntry>),
    Info { active: usize },
    Reloaded { definitions: usize },
    ReloadFailed(String),
    StoreFailed(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnlyOwners => write!(f, "Only players can use this command."),
            Self::NoPermission => write!(f, "You do not have permission."),
            Self::PlayerNotFound(p) => write!(f, "Player '{p}' not found."),
            Self::UnknownCompanion(id) => write!(f, "Companion '{id}' not found."),
            Self::Equipped(name) => write!(f, "Equipped {name}."),
            Self::EquipFailed(why) => write!(f, "Could not equip: {why}."),
            Self::Unequipped => write!(f, "Companion unequipped."),
            Self::Given { player, id } => write!(f, "Gave '{id}' to {player}."),
            Self::Removed { player, id } => write!(f, "Removed '{id}' from {player}."),
            Self::List(entries) => {
                write!(f, "Companions:")?;
                for e in entries {
                    write!(f, "\n  - {} ({}, {})", e.id, e.name, e.rarity.label())?;
                }
                Ok(())
            }
            Self::Info { active } => write!(f, "Active companions: {active}"),
            Self::Reloaded { definitions } => write!(f, "Reloaded {definitions} companions."),
            Self::ReloadFailed(why) => write!(f, "Reload failed: {why}"),
            Self::StoreFailed(why) => write!(f, "Storage error: {why}"),
        }
    }
}

impl<W, D, S> CompanionServer<W, D, S>
where
    W: WorldGateway,
    D: OwnerDirectory,
    S: OwnershipStore,
{
    pub fn execute(&mut self, sender: CommandSender, cmd: Command) -> Reply {
        if cmd.needs_admin()
            && let CommandSender::Owner(o) = sender
            && !self.owners.has_permission(o, ADMIN_PERMISSION)
        {
            return Reply::NoPermission;
        }
        match cmd {
            Command::Equip { id } => {
                let CommandSender::Owner(owner) = sender else {
                    return Reply::OnlyOwners;
                };
                match self.equip(owner, &id) {
                    Ok(()) => {
                        let name = self.registry.get(&id).map_or(id, |d| d.name.clone());
                        Reply::Equipped(name)
                    }
                    Err(EquipError::UnknownCompanion(id)) => Reply::UnknownCompanion(id),
                    Err(e) => Reply::EquipFailed(e.to_string()),
                }
            }
            Command::Unequip => {
                let CommandSender::Owner(owner) = sender else {
                    return Reply::OnlyOwners;
                };
                match self.unequip(owner) {
                    Ok(()) => Reply::Unequipped,
                    Err(e) => Reply::StoreFailed(e.to_string()),
                }
            }
            Command::Give { player, id } => {
                let Some(target) = self.owners.find_by_name(&player) else {
                    return Reply::PlayerNotFound(player);
                };
                if !self.registry.contains(&id) {
                    return Reply::UnknownCompanion(id);
                }
                match self.store.add_owned(target, &id) {
                    Ok(()) => {
                        log::info!("give {target} '{id}'");
                        Reply::Given { player, id }
                    }
                    Err(e) => Reply::StoreFailed(e.to_string()),
                }
            }
            Command::Remove { player, id } => {
                let Some(target) = self.owners.find_by_name(&player) else {
                    return Reply::PlayerNotFound(player);
                };
                match self.store.remove_owned(target, &id) {
                    Ok(()) => {
                        log::info!("remove {target} '{id}'");
                        Reply::Removed { player, id }
                    }
                    Err(e) => Reply::StoreFailed(e.to_string()),
                }
            }
            Command::List => Reply::List(
                self.registry
                    .by_rarity()
                    .iter()
                    .map(|d| ListEntry { id: d.id.clone(), name: d.name.clone(), rarity: d.rarity })
                    .collect(),
            ),
            Command::Info => Reply::Info { active: self.active_count() },
            Command::Reload => match self.reload() {
                Ok(definitions) => Reply::Reloaded { definitions },
                Err(e) => Reply::ReloadFailed(format!("{e:#}")),
            },
        }
    }
}
