use anyhow::{bail, Context, Error};
use navstack_core::navigation::{NavigationEngine, WidgetArgs, WidgetTypeId};
use std::io::{BufRead, Write};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Screen { widget: String, args: WidgetArgs },
    Popup { widget: String, args: WidgetArgs },
    Pop,
    Back,
    ClosePopups,
    PopTo(u64),
    Stack { json: bool },
    Stats,
    Types,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Parses one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "screen" | "popup" => {
            let (widget, raw_args) = match rest.split_once(char::is_whitespace) {
                Some((widget, raw_args)) => (widget, raw_args.trim()),
                None => (rest, ""),
            };
            if widget.is_empty() {
                bail!("usage: {} <Type> [json-args]", verb);
            }
            let args = parse_args(raw_args)?;
            let widget = widget.to_string();
            if verb == "screen" {
                ShellCommand::Screen { widget, args }
            } else {
                ShellCommand::Popup { widget, args }
            }
        }
        "pop" => ShellCommand::Pop,
        "back" => ShellCommand::Back,
        "close-popups" => ShellCommand::ClosePopups,
        "pop-to" => {
            let id = rest
                .trim_start_matches('#')
                .parse::<u64>()
                .with_context(|| format!("invalid context id {:?}", rest))?;
            ShellCommand::PopTo(id)
        }
        "stack" => match rest {
            "" => ShellCommand::Stack { json: false },
            "json" => ShellCommand::Stack { json: true },
            _ => bail!("usage: stack [json]"),
        },
        "stats" => ShellCommand::Stats,
        "types" => ShellCommand::Types,
        "quit" | "exit" => ShellCommand::Quit,
        _ => bail!("unknown command {:?}", verb),
    };

    Ok(Some(command))
}

fn parse_args(raw: &str) -> Result<WidgetArgs, Error> {
    if raw.is_empty() {
        return Ok(WidgetArgs::new());
    }
    let value: serde_json::Value =
        serde_json::from_str(raw).context("widget arguments must be JSON")?;
    if !value.is_object() {
        bail!("widget arguments must be a JSON object");
    }
    Ok(WidgetArgs::from(value))
}

pub struct Shell<'a> {
    engine: &'a NavigationEngine,
}

impl<'a> Shell<'a> {
    pub fn new(engine: &'a NavigationEngine) -> Self {
        Shell { engine }
    }

    /// Runs commands from `input` until it is exhausted or `quit` is read.
    ///
    /// Bad input and rejected navigations are reported on `output` and the
    /// loop carries on.
    pub fn run<R: BufRead, W: Write>(&self, input: R, output: &mut W) -> Result<(), Error> {
        for line in input.lines() {
            let line = line.context("can't read command")?;
            let command = match parse_line(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(err) => {
                    writeln!(output, "error: {:#}", err)?;
                    continue;
                }
            };
            match self.execute(command, output) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(err) => {
                    warn!(error = %format!("{:#}", err), "command failed");
                    writeln!(output, "error: {:#}", err)?;
                }
            }
        }
        Ok(())
    }

    pub fn execute<W: Write>(&self, command: ShellCommand, output: &mut W) -> Result<Flow, Error> {
        match command {
            ShellCommand::Screen { widget, args } => {
                let info = self.engine.push_screen(self.resolve(&widget)?, args)?;
                writeln!(output, "pushed {} {}", info.token(), info.id)?;
            }
            ShellCommand::Popup { widget, args } => {
                let info = self.engine.push_popup(self.resolve(&widget)?, args)?;
                writeln!(output, "pushed {} {}", info.token(), info.id)?;
            }
            ShellCommand::Pop => {
                if !self.engine.pop()? {
                    writeln!(output, "stack is empty")?;
                }
            }
            ShellCommand::Back => {
                if !self.engine.back()? {
                    writeln!(output, "cannot go back further")?;
                }
            }
            ShellCommand::ClosePopups => {
                let closed = self.engine.close_all_popups()?;
                writeln!(output, "closed {} popup(s)", closed)?;
            }
            ShellCommand::PopTo(raw) => {
                let snapshot = self.engine.snapshot();
                let Some(target) = snapshot.contexts().iter().find(|info| info.id.get() == raw)
                else {
                    bail!("no context #{} on the stack", raw);
                };
                let removed = self.engine.pop_to(target.id)?;
                writeln!(output, "removed {} context(s)", removed)?;
            }
            ShellCommand::Stack { json } => {
                let snapshot = self.engine.snapshot();
                if json {
                    writeln!(output, "{}", snapshot.to_json()?)?;
                } else if snapshot.is_empty() {
                    writeln!(output, "(empty)")?;
                } else {
                    for info in snapshot.contexts() {
                        let marker = if info.visible { "*" } else { " " };
                        writeln!(output, "{} {:>4} {}", marker, info.id, info.token())?;
                    }
                }
            }
            ShellCommand::Stats => {
                let snapshot = self.engine.snapshot();
                let current = snapshot
                    .current_context()
                    .map(|info| info.token())
                    .unwrap_or_else(|| "-".to_string());
                writeln!(
                    output,
                    "contexts: {}, screens: {}, popups: {}, current: {}, popup on top: {}",
                    snapshot.stack_count(),
                    snapshot.screen_count(),
                    snapshot.popup_count(),
                    current,
                    snapshot.has_popup_on_top()
                )?;
            }
            ShellCommand::Types => {
                for widget_type in self.engine.registered_widgets() {
                    writeln!(output, "{}", widget_type)?;
                }
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn resolve(&self, name: &str) -> Result<WidgetTypeId, Error> {
        self.engine
            .registered_widgets()
            .into_iter()
            .find(|id| id.name() == name)
            .with_context(|| format!("no widget registered for type {}", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_registry;
    use navstack_core::settings::NavigationSettings;

    fn run_script(script: &str) -> Result<(NavigationEngine, String), Error> {
        let engine = NavigationEngine::new(demo_registry(), NavigationSettings::default());
        let mut output = Vec::new();
        Shell::new(&engine).run(script.as_bytes(), &mut output)?;
        Ok((engine, String::from_utf8(output)?))
    }

    #[test]
    fn test_parse_push_with_json_args() -> Result<(), Error> {
        let command = parse_line(r#"popup GachaResult {"pulls": 10, "rare": true}"#)?;
        let Some(ShellCommand::Popup { widget, args }) = command else {
            panic!("expected popup command, got {:?}", command);
        };
        assert_eq!(widget, "GachaResult");
        assert_eq!(args.get_i64("pulls"), Some(10));
        assert_eq!(args.get_bool("rare"), Some(true));
        Ok(())
    }

    #[test]
    fn test_parse_simple_commands() -> Result<(), Error> {
        assert_eq!(parse_line("  ")?, None);
        assert_eq!(parse_line("# comment")?, None);
        assert_eq!(parse_line("back")?, Some(ShellCommand::Back));
        assert_eq!(parse_line("close-popups")?, Some(ShellCommand::ClosePopups));
        assert_eq!(parse_line("pop-to #3")?, Some(ShellCommand::PopTo(3)));
        assert_eq!(
            parse_line("stack json")?,
            Some(ShellCommand::Stack { json: true })
        );
        assert_eq!(
            parse_line("screen Title")?,
            Some(ShellCommand::Screen {
                widget: "Title".to_string(),
                args: WidgetArgs::new(),
            })
        );
        Ok(())
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_line("jump").is_err());
        assert!(parse_line("screen").is_err());
        assert!(parse_line("screen Title [1, 2]").is_err());
        assert!(parse_line("screen Title {oops").is_err());
        assert!(parse_line("pop-to top").is_err());
    }

    #[test]
    fn test_script_drives_engine() -> Result<(), Error> {
        let (engine, output) = run_script(
            "screen Title\nscreen Lobby\npopup Settings\npopup Confirm\nclose-popups\nback\nback\n",
        )?;
        assert!(output.contains("closed 2 popup(s)"));
        assert!(output.contains("cannot go back further"));
        assert_eq!(engine.stack_debug_string(), "Screen:Title");
        Ok(())
    }

    #[test]
    fn test_script_continues_after_errors() -> Result<(), Error> {
        let (engine, output) = run_script("screen Missing\nbogus\nscreen Title\n")?;
        assert!(output.contains("no widget registered for type Missing"));
        assert!(output.contains("unknown command"));
        assert_eq!(engine.stack_count(), 1);
        Ok(())
    }

    #[test]
    fn test_quit_stops_reading() -> Result<(), Error> {
        let (engine, _) = run_script("screen Title\nquit\nscreen Lobby\n")?;
        assert_eq!(engine.stack_count(), 1);
        Ok(())
    }

    #[test]
    fn test_pop_to_by_displayed_id() -> Result<(), Error> {
        let engine = NavigationEngine::new(demo_registry(), NavigationSettings::default());
        let shell = Shell::new(&engine);
        let mut output = Vec::new();
        let lobby = engine.push_screen(crate::demo::LOBBY, WidgetArgs::new())?;
        engine.push_screen(crate::demo::GACHA, WidgetArgs::new())?;
        engine.push_popup(crate::demo::GACHA_RESULT, WidgetArgs::new())?;

        shell.execute(ShellCommand::PopTo(lobby.id.get()), &mut output)?;

        assert_eq!(engine.stack_debug_string(), "Screen:Lobby");
        assert!(shell.execute(ShellCommand::PopTo(u64::MAX), &mut output).is_err());
        Ok(())
    }
}
