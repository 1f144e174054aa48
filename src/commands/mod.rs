//! Console front-end.
//!
//! Reads line commands typed on stdin and turns them into
//! [`SessionCommand`](crate::session::SessionCommand)s, and renders the session
//! in the terminal.
//!
//! # Commands
//!
//! | Command | Arguments | Description |
//! |---------|-----------|-------------|
//! | `filter line` | `all` or a line group (`123`, `ACE`, `NQRW`...) | Line facet |
//! | `filter severity` | `all`, `critical`, `warning`, `info` | Severity facet |
//! | `filter time` | `all`, `active`, `rush`, `planned` | Time facet |
//! | `filter location` | `all`, `near`, a borough | Location facet |
//! | `rush` | None | Toggle rush hour mode |
//! | `sound` | None | Toggle alert sounds |
//! | `theme` | None | Toggle light/dark theme |
//! | `font` | `small`, `medium`, `large`, `larger`, `smaller` | Font size |
//! | `lang` | Language code | Switch language |
//! | `near` | `<lat> <lng>`, or nothing | Set or clear your position |
//! | `favorite` | Alert id | Toggle a favorite |
//! | `share` | Alert id | Share an alert |
//! | `refresh` | None | Fetch alerts now |
//! | `reset` | None | Reset every preference |
//! | `quit` | None | Stop |
//!
//! This module carries no session logic: every command is forwarded as is.

mod command;
mod console;

pub use crate::commands::command::{CommandParseError, parse_line};
pub use crate::commands::console::{ConsolePresenter, ConsoleShareTarget};
