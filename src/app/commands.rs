//! Line commands understood by the terminal shell.

use std::str::FromStr;

use thiserror::Error;

use crate::models::schedule::{Day, EntryType, TimeSlot};

pub const HELP: &str = "\
Commands:
  show                              print the schedule
  edit                              enter edit mode
  open <day> <HH:00>                open the editor for one cell
  set <day> <HH:00> <type> <text>   update one cell
                                    (type: work, break, meeting, learning, available, empty)
  clear <day> <HH:00>               remove one cell
  close                             close the cell editor
  save                              save, sync and leave edit mode
  cancel                            discard edits and leave edit mode
  status                            show the connection status
  sync                              apply pending updates from other viewers
  help                              show this help
  quit                              exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Edit,
    Open {
        day: Day,
        time: TimeSlot,
    },
    Set {
        day: Day,
        time: TimeSlot,
        entry_type: EntryType,
        activity: String,
    },
    Clear {
        day: Day,
        time: TimeSlot,
    },
    Close,
    Save,
    Cancel,
    Status,
    Sync,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("{0}")]
    InvalidArgument(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?.to_lowercase();

        let command = match name.as_str() {
            "show" | "ls" => Command::Show,
            "edit" => Command::Edit,
            "open" => {
                let (day, time) = cell_address(&mut words)?;
                Command::Open { day, time }
            }
            "set" => {
                let (day, time) = cell_address(&mut words)?;
                let entry_type = words
                    .next()
                    .ok_or(CommandError::MissingArgument("entry type"))?
                    .parse::<EntryType>()
                    .map_err(CommandError::InvalidArgument)?;
                let activity = words.collect::<Vec<_>>().join(" ");
                Command::Set {
                    day,
                    time,
                    entry_type,
                    activity,
                }
            }
            "clear" => {
                let (day, time) = cell_address(&mut words)?;
                Command::Clear { day, time }
            }
            "close" => Command::Close,
            "save" => Command::Save,
            "cancel" => Command::Cancel,
            "status" => Command::Status,
            "sync" => Command::Sync,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(name)),
        };

        Ok(command)
    }
}

fn cell_address<'a>(
    words: &mut impl Iterator<Item = &'a str>,
) -> Result<(Day, TimeSlot), CommandError> {
    let day = words
        .next()
        .ok_or(CommandError::MissingArgument("day"))?
        .parse::<Day>()
        .map_err(CommandError::InvalidArgument)?;
    let time = words
        .next()
        .ok_or(CommandError::MissingArgument("time"))?
        .parse::<TimeSlot>()
        .map_err(CommandError::InvalidArgument)?;
    Ok((day, time))
}
