//! Interactive play: one action per line.

use rustyline::error::ReadlineError;
use std::fmt::Write as _;
use tb_env::{ActionDescriptor, EnvConfig, Episode};
use tracing::info;

const HELP: &str = "\
Actions (applied to the real board unless noted):
  add|sub|mul|div <expr>       both sides
  simplify | expand | factor   each side
  collect [var]                group terms in var (default: the unknown)
  power <n>                    raise both sides to a numeric power
  write <text>                 append to the imaginary board
  copy [lhs|rhs|<expr>]        write the equation, one side, or an expression
  subs [<target> ->] <expr>    substitute a constructible expression
  reset                        restore the initial equation
  complete | unsolvable        terminal declarations
Session:
  board | valid | json | new <equation> | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Act(ActionDescriptor),
    Board,
    Valid,
    Json,
    New(String),
    Help,
    Quit,
}

/// Splits a line into its keyword and the (trimmed) remainder.
fn split_keyword(line: &str) -> (String, &str) {
    let line = line.trim();
    match line.find(char::is_whitespace) {
        Some(i) => (line[..i].to_ascii_lowercase(), line[i..].trim()),
        None => (line.to_ascii_lowercase(), ""),
    }
}

pub fn parse_line(line: &str) -> Command {
    let (keyword, rest) = split_keyword(line);
    match keyword.as_str() {
        "quit" | "exit" => return Command::Quit,
        "help" | "?" => return Command::Help,
        "board" | "show" => return Command::Board,
        "valid" | "available" => return Command::Valid,
        "json" => return Command::Json,
        "new" => return Command::New(rest.to_string()),
        _ => {}
    }

    let mut d = ActionDescriptor::new(&keyword);
    if rest.is_empty() {
        return Command::Act(d);
    }
    d = match keyword.as_str() {
        "write" => d.with_text(rest),
        "collect" => d.with_target(rest),
        "copy" => match rest.to_ascii_lowercase().as_str() {
            "equation" | "both" | "lhs" | "left" | "rhs" | "right" => d.with_target(rest),
            _ => d.with_expr(rest),
        },
        _ => match rest.split_once("->") {
            Some((target, expr)) => d.with_target(target.trim()).with_expr(expr.trim()),
            None => d.with_expr(rest),
        },
    };
    Command::Act(d)
}

pub enum Reply {
    Continue(String),
    Quit,
}

/// One interactive episode plus its running reward.
pub struct Session {
    config: EnvConfig,
    unknown: Option<String>,
    episode: Episode,
    total: f64,
}

impl Session {
    pub fn new(equation: &str, unknown: Option<String>, config: EnvConfig) -> anyhow::Result<Self> {
        let episode = Episode::symbolic(equation, unknown.as_deref(), config.clone())?;
        Ok(Self {
            config,
            unknown,
            episode,
            total: 0.0,
        })
    }

    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    pub fn banner(&self) -> String {
        format!(
            "{} ({}, unknown {}, L = {}). Type `help` for actions.",
            self.episode.initial_equation(),
            self.config.variant,
            self.episode.unknown(),
            self.episode.reward_length()
        )
    }

    pub fn handle(&mut self, line: &str) -> Reply {
        let text = match parse_line(line) {
            Command::Quit => return Reply::Quit,
            Command::Help => HELP.to_string(),
            Command::Board => self.episode.inspect().to_string(),
            Command::Valid => self.episode.constructible().to_string(),
            Command::Json => match self.episode.inspect().to_json() {
                Ok(json) => json,
                Err(e) => format!("Error: {}", e),
            },
            Command::New(equation) => {
                match Episode::symbolic(&equation, self.unknown.as_deref(), self.config.clone()) {
                    Ok(episode) => {
                        self.episode = episode;
                        self.total = 0.0;
                        self.banner()
                    }
                    Err(e) => format!("Error: {}", e),
                }
            }
            Command::Act(d) => self.act(&d),
        };
        Reply::Continue(text)
    }

    fn act(&mut self, d: &ActionDescriptor) -> String {
        match self.episode.step_descriptor(d) {
            Ok(reward) => {
                self.total += reward;
                let mut out = format!(
                    "{}   reward {}   total {}",
                    self.episode.inspect().equation(),
                    reward,
                    self.total
                );
                if self.episode.is_terminal() {
                    info!(total = self.total, "episode finished");
                    let _ = write!(out, "\nEpisode over. `new <equation>` to start another.");
                }
                out
            }
            Err(e) => format!("Error: {}", e),
        }
    }
}

pub fn run(mut session: Session) -> anyhow::Result<()> {
    println!("{}", session.banner());

    let mut rl = rustyline::DefaultEditor::new()?;
    let history_path = dirs::home_dir()
        .map(|p| p.join(".tb_history"))
        .unwrap_or_else(|| std::path::PathBuf::from(".tb_history"));
    let _ = rl.load_history(&history_path);

    loop {
        let prompt = format!("[{}] > ", session.episode().inspect().steps);
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                match session.handle(line) {
                    Reply::Continue(text) => println!("{}", text),
                    Reply::Quit => break,
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    let _ = rl.save_history(&history_path);
    Ok(())
}
