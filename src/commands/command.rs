//! Console command parsing.
//!
//! Converts a line typed on stdin into a [`SessionCommand`]. Parsing is done by
//! `clap` without a binary name, so `filter severity critical` is parsed like
//! the arguments of a `filter` subcommand.

use clap::{Parser, Subcommand, error::ErrorKind};
use log::debug;
use thiserror::Error;

use crate::{
    alerts::{
        GeoPoint,
        filter::{LineFilter, LocationFilter, SeverityFilter, TimeFilter},
        lines::line_group,
    },
    preferences::FontSize,
    session::SessionCommand,
};

/// Errors that can occur while parsing a console line.
#[derive(Debug, Error, PartialEq)]
pub enum CommandParseError {
    /// Help was requested or the line is not a known command, carries the
    /// rendered usage text
    #[error("{0}")]
    Usage(String),
    #[error("invalid {facet} value {value}")]
    InvalidValue { facet: &'static str, value: String },
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ConsoleLine {
    #[command(subcommand)]
    command: ConsoleCommand,
}

#[derive(Subcommand, Debug)]
enum ConsoleCommand {
    /// Set one filter facet
    Filter {
        #[command(subcommand)]
        facet: FilterFacet,
    },
    /// Toggle rush hour mode
    Rush,
    /// Toggle alert sounds
    Sound,
    /// Toggle light/dark theme
    Theme,
    /// Change font size: small, medium, large, larger or smaller
    Font { size: String },
    /// Switch language, e.g. `lang fr`
    Lang { code: String },
    /// Set your position (`near 40.73 -73.99`), or clear it with `near`
    Near {
        #[arg(num_args = 0..=2, allow_negative_numbers = true)]
        coordinates: Vec<f64>,
    },
    /// Add or remove an alert from favorites
    Favorite { id: String },
    /// Share an alert
    Share { id: String },
    /// Fetch alerts now
    Refresh,
    /// Reset every preference to its default
    Reset,
    /// Stop the session
    Quit,
}

#[derive(Subcommand, Debug)]
enum FilterFacet {
    /// `all` or a line group such as `ACE`
    Line { value: String },
    /// `all`, `critical`, `warning` or `info`
    Severity { value: String },
    /// `all`, `active`, `rush` or `planned`
    Time { value: String },
    /// `all`, `near` or a borough such as `staten-island`
    Location { value: String },
}

/// Parses a console line.
///
/// Returns `Ok(None)` for a blank line.
///
/// # Examples
///
/// ```no_run
/// assert_eq!(
///     parse_line("filter severity critical"),
///     Ok(Some(SessionCommand::SetSeverityFilter(SeverityFilter::Only(Severity::Critical))))
/// );
/// assert_eq!(parse_line("   "), Ok(None));
/// ```
pub fn parse_line(line: &str) -> Result<Option<SessionCommand>, CommandParseError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }

    let parsed = ConsoleLine::try_parse_from(words).map_err(|e| {
        if e.kind() != ErrorKind::DisplayHelp {
            debug!("unable to parse console line {:?}: {}", line, e.kind());
        }
        CommandParseError::Usage(e.render().to_string())
    })?;

    let command = match parsed.command {
        ConsoleCommand::Filter { facet } => parse_filter(facet)?,
        ConsoleCommand::Rush => SessionCommand::ToggleRushHourMode,
        ConsoleCommand::Sound => SessionCommand::ToggleSound,
        ConsoleCommand::Theme => SessionCommand::ToggleTheme,
        ConsoleCommand::Font { size } => parse_font(size)?,
        ConsoleCommand::Lang { code } => SessionCommand::SetLanguage(code),
        ConsoleCommand::Near { coordinates } => match coordinates.as_slice() {
            [] => SessionCommand::SetUserLocation(None),
            [lat, lng] if (-90.0..=90.0).contains(lat) && (-180.0..=180.0).contains(lng) => {
                SessionCommand::SetUserLocation(Some(GeoPoint {
                    lat: *lat,
                    lng: *lng,
                }))
            }
            _ => {
                return Err(CommandParseError::InvalidValue {
                    facet: "location",
                    value: format!("{:?}", coordinates),
                });
            }
        },
        ConsoleCommand::Favorite { id } => SessionCommand::ToggleFavorite(id),
        ConsoleCommand::Share { id } => SessionCommand::ShareAlert(id),
        ConsoleCommand::Refresh => SessionCommand::Refresh,
        ConsoleCommand::Reset => SessionCommand::ClearPreferences,
        ConsoleCommand::Quit => SessionCommand::Shutdown,
    };

    debug!("parsed console command {:?}", command);
    Ok(Some(command))
}

fn parse_filter(facet: FilterFacet) -> Result<SessionCommand, CommandParseError> {
    match facet {
        FilterFacet::Line { value } => {
            if value != "all" && line_group(&value).is_none() {
                return Err(CommandParseError::InvalidValue {
                    facet: "line",
                    value,
                });
            }
            Ok(SessionCommand::SetLineFilter(LineFilter::from(value)))
        }
        FilterFacet::Severity { value } => SeverityFilter::try_from(value.clone())
            .map(SessionCommand::SetSeverityFilter)
            .map_err(|_| CommandParseError::InvalidValue {
                facet: "severity",
                value,
            }),
        FilterFacet::Time { value } => {
            let time = match value.as_str() {
                "all" => TimeFilter::All,
                "active" => TimeFilter::Active,
                "rush" => TimeFilter::Rush,
                "planned" => TimeFilter::Planned,
                _ => {
                    return Err(CommandParseError::InvalidValue {
                        facet: "time",
                        value,
                    });
                }
            };
            Ok(SessionCommand::SetTimeFilter(time))
        }
        FilterFacet::Location { value } => LocationFilter::try_from(value.clone())
            .map(SessionCommand::SetLocationFilter)
            .map_err(|_| CommandParseError::InvalidValue {
                facet: "location",
                value,
            }),
    }
}

fn parse_font(size: String) -> Result<SessionCommand, CommandParseError> {
    let command = match size.as_str() {
        "small" => SessionCommand::SetFontSize(FontSize::Small),
        "medium" => SessionCommand::SetFontSize(FontSize::Medium),
        "large" => SessionCommand::SetFontSize(FontSize::Large),
        "larger" => SessionCommand::IncreaseFontSize,
        "smaller" => SessionCommand::DecreaseFontSize,
        _ => {
            return Err(CommandParseError::InvalidValue {
                facet: "font size",
                value: size,
            });
        }
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{Borough, Severity};

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("  \t "), Ok(None));
    }

    #[test]
    fn test_parse_filter_commands() {
        assert_eq!(
            parse_line("filter line ACE"),
            Ok(Some(SessionCommand::SetLineFilter(LineFilter::Group(
                "ACE".to_string()
            ))))
        );
        assert_eq!(
            parse_line("filter line all"),
            Ok(Some(SessionCommand::SetLineFilter(LineFilter::All)))
        );
        assert_eq!(
            parse_line("filter severity critical"),
            Ok(Some(SessionCommand::SetSeverityFilter(SeverityFilter::Only(
                Severity::Critical
            ))))
        );
        assert_eq!(
            parse_line("filter time planned"),
            Ok(Some(SessionCommand::SetTimeFilter(TimeFilter::Planned)))
        );
        assert_eq!(
            parse_line("filter location staten-island"),
            Ok(Some(SessionCommand::SetLocationFilter(LocationFilter::Region(
                Borough::StatenIsland
            ))))
        );
        assert_eq!(
            parse_line("filter location near"),
            Ok(Some(SessionCommand::SetLocationFilter(LocationFilter::NearMe)))
        );
    }

    #[test]
    fn test_parse_filter_invalid_values() {
        assert_eq!(
            parse_line("filter line XYZ"),
            Err(CommandParseError::InvalidValue {
                facet: "line",
                value: "XYZ".to_string()
            })
        );
        assert!(matches!(
            parse_line("filter severity fatal"),
            Err(CommandParseError::InvalidValue { facet: "severity", .. })
        ));
        assert!(matches!(
            parse_line("filter time later"),
            Err(CommandParseError::InvalidValue { facet: "time", .. })
        ));
        assert!(matches!(
            parse_line("filter location mars"),
            Err(CommandParseError::InvalidValue { facet: "location", .. })
        ));
    }

    #[test]
    fn test_parse_toggles() {
        assert_eq!(
            parse_line("rush"),
            Ok(Some(SessionCommand::ToggleRushHourMode))
        );
        assert_eq!(parse_line("sound"), Ok(Some(SessionCommand::ToggleSound)));
        assert_eq!(parse_line("theme"), Ok(Some(SessionCommand::ToggleTheme)));
        assert_eq!(
            parse_line("reset"),
            Ok(Some(SessionCommand::ClearPreferences))
        );
        assert_eq!(parse_line("refresh"), Ok(Some(SessionCommand::Refresh)));
        assert_eq!(parse_line("quit"), Ok(Some(SessionCommand::Shutdown)));
    }

    #[test]
    fn test_parse_font() {
        assert_eq!(
            parse_line("font large"),
            Ok(Some(SessionCommand::SetFontSize(FontSize::Large)))
        );
        assert_eq!(
            parse_line("font larger"),
            Ok(Some(SessionCommand::IncreaseFontSize))
        );
        assert_eq!(
            parse_line("font smaller"),
            Ok(Some(SessionCommand::DecreaseFontSize))
        );
        assert!(matches!(
            parse_line("font huge"),
            Err(CommandParseError::InvalidValue { facet: "font size", .. })
        ));
    }

    #[test]
    fn test_parse_lang_favorite_share() {
        assert_eq!(
            parse_line("lang fr"),
            Ok(Some(SessionCommand::SetLanguage("fr".to_string())))
        );
        assert_eq!(
            parse_line("favorite sim-001"),
            Ok(Some(SessionCommand::ToggleFavorite("sim-001".to_string())))
        );
        assert_eq!(
            parse_line("share sim-002"),
            Ok(Some(SessionCommand::ShareAlert("sim-002".to_string())))
        );
    }

    #[test]
    fn test_parse_near() {
        assert_eq!(
            parse_line("near 40.73 -73.99"),
            Ok(Some(SessionCommand::SetUserLocation(Some(GeoPoint {
                lat: 40.73,
                lng: -73.99
            }))))
        );
        assert_eq!(
            parse_line("near"),
            Ok(Some(SessionCommand::SetUserLocation(None)))
        );
        assert!(matches!(
            parse_line("near 40.73"),
            Err(CommandParseError::InvalidValue { facet: "location", .. })
        ));
        assert!(matches!(
            parse_line("near 140 20"),
            Err(CommandParseError::InvalidValue { facet: "location", .. })
        ));
    }

    #[test]
    fn test_parse_unknown_and_missing_arguments() {
        assert!(matches!(
            parse_line("launch"),
            Err(CommandParseError::Usage(_))
        ));
        assert!(matches!(parse_line("lang"), Err(CommandParseError::Usage(_))));
        assert!(matches!(
            parse_line("filter"),
            Err(CommandParseError::Usage(_))
        ));
    }

    #[test]
    fn test_parse_help_lists_commands() {
        let Err(CommandParseError::Usage(usage)) = parse_line("help") else {
            panic!("help should render usage");
        };
        assert!(usage.contains("filter"));
        assert!(usage.contains("favorite"));
    }
}
