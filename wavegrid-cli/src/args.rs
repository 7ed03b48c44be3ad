//! Command-line arguments.

use std::path::PathBuf;

use wavegrid::prelude::*;

use crate::error::CliError;

pub const USAGE: &str = "\
Usage: wavegrid <rows.json> [options]

Options:
  --config <path>        Grid configuration (default: <config dir>/grid.json)
  --page <n>             Show 1-based page n
  --page-size <n>        Rows per page
  --sort <field[:desc]>  Order by a sortable column
  --select <id,...>      Click the selection control of each row
  --expand <id>          Toggle expansion of a row (repeatable)
  --toggle <id:field>    Flip a checkbox cell in the edit overlay (repeatable)
  --commit               Print committed row patches as JSON
  --width <px>           Viewport width used for responsive columns
  --state-url <url>      Keep widget state in this URL instead of local storage
  --reset                Forget saved widget state before running
  -v, --verbose          Log at debug level";

/// Parsed arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    pub rows: PathBuf,
    pub config: Option<PathBuf>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub sort: Option<(String, SortDirection)>,
    pub select: Vec<RowId>,
    pub expand: Vec<RowId>,
    pub toggle: Vec<(RowId, String)>,
    pub commit: bool,
    pub width: Option<u32>,
    pub state_url: Option<String>,
    pub reset: bool,
    pub verbose: bool,
}

/// Parse a row identity. `#3` names a positional row; anything else is a key.
pub fn parse_row_id(text: &str) -> RowId {
    match text.strip_prefix('#').and_then(|n| n.parse().ok()) {
        Some(index) => RowId::Index(index),
        None => RowId::key(text),
    }
}

fn number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, CliError> {
    value
        .parse()
        .map_err(|_| CliError::usage(format!("{} expects a number, got '{}'", flag, value)))
}

impl Args {
    /// Parse arguments, excluding the program name.
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Args::default();
        let mut rows = None;
        let mut iter = args.into_iter();

        while let Some(arg) = iter.next() {
            let mut value = |flag: &str| {
                iter.next()
                    .ok_or_else(|| CliError::usage(format!("{} needs a value", flag)))
            };
            match arg.as_str() {
                "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
                "--page" => parsed.page = Some(number("--page", &value("--page")?)?),
                "--page-size" => parsed.page_size = Some(number("--page-size", &value("--page-size")?)?),
                "--sort" => {
                    let text = value("--sort")?;
                    parsed.sort = Some(match text.split_once(':') {
                        Some((field, "desc")) => (field.to_string(), SortDirection::Desc),
                        Some((field, "asc")) => (field.to_string(), SortDirection::Asc),
                        Some((_, other)) => {
                            return Err(CliError::usage(format!("Unknown sort direction '{}'", other)));
                        }
                        None => (text.clone(), SortDirection::Asc),
                    });
                }
                "--select" => parsed
                    .select
                    .extend(value("--select")?.split(',').filter(|s| !s.is_empty()).map(parse_row_id)),
                "--expand" => parsed.expand.push(parse_row_id(&value("--expand")?)),
                "--toggle" => {
                    let text = value("--toggle")?;
                    let (id, field) = text
                        .rsplit_once(':')
                        .ok_or_else(|| CliError::usage("--toggle expects <id:field>"))?;
                    parsed.toggle.push((parse_row_id(id), field.to_string()));
                }
                "--commit" => parsed.commit = true,
                "--width" => parsed.width = Some(number("--width", &value("--width")?)?),
                "--state-url" => parsed.state_url = Some(value("--state-url")?),
                "--reset" => parsed.reset = true,
                "-v" | "--verbose" => parsed.verbose = true,
                "-h" | "--help" => return Err(CliError::usage("")),
                flag if flag.starts_with('-') => {
                    return Err(CliError::usage(format!("Unknown option '{}'", flag)));
                }
                path => {
                    if rows.replace(PathBuf::from(path)).is_some() {
                        return Err(CliError::usage("Only one rows file may be given"));
                    }
                }
            }
        }

        parsed.rows = rows.ok_or_else(|| CliError::usage("Missing rows file"))?;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, CliError> {
        Args::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_full_command() {
        let args = parse(&[
            "rows.json",
            "--page",
            "2",
            "--sort",
            "name:desc",
            "--select",
            "1,#4",
            "--toggle",
            "5:active",
            "--commit",
        ])
        .unwrap();
        assert_eq!(args.rows, PathBuf::from("rows.json"));
        assert_eq!(args.page, Some(2));
        assert_eq!(args.sort, Some(("name".to_string(), SortDirection::Desc)));
        assert_eq!(args.select, vec![RowId::key("1"), RowId::Index(4)]);
        assert_eq!(args.toggle, vec![(RowId::key("5"), "active".to_string())]);
        assert!(args.commit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse(&[]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["a.json", "--page"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["a.json", "--page", "x"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["a.json", "b.json"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["a.json", "--bogus"]), Err(CliError::Usage(_))));
    }
}
