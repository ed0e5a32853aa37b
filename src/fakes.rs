//! Scripted command runner (testing only)
//!
//! `ScriptedRunner` satisfies [`CommandRunner`] without spawning anything.
//! Rules are checked in insertion order; the first whose matcher accepts the
//! argv decides the reply. Unmatched commands succeed with empty output.

use std::sync::Mutex;

use crate::error::BuildError;
use crate::process::{Cmd, CommandOutput, CommandRunner};

type Matcher = Box<dyn Fn(&[String]) -> bool + Send + Sync>;
type Effect = Box<dyn Fn() + Send + Sync>;

/// What a scripted command answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(CommandOutput),
    Fail { code: i32, stderr: String },
}

impl Reply {
    pub fn stdout(text: impl Into<String>) -> Self {
        Reply::Ok(CommandOutput::from_stdout(text))
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Reply::Ok(CommandOutput {
            stdout: String::new(),
            stderr: text.into(),
        })
    }

    pub fn fail(code: i32, stderr: impl Into<String>) -> Self {
        Reply::Fail {
            code,
            stderr: stderr.into(),
        }
    }
}

struct Rule {
    matcher: Matcher,
    reply: Reply,
    effect: Option<Effect>,
}

/// A runner that records every invocation and answers from rules.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    calls: Mutex<Vec<Cmd>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to commands whose argv satisfies `matcher`.
    pub fn on<F>(mut self, matcher: F, reply: Reply) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            matcher: Box::new(matcher),
            reply,
            effect: None,
        });
        self
    }

    /// Like [`on`](Self::on), also running `effect` before replying.
    pub fn on_with<F, E>(mut self, matcher: F, reply: Reply, effect: E) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
        E: Fn() + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            matcher: Box::new(matcher),
            reply,
            effect: Some(Box::new(effect)),
        });
        self
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<Cmd> {
        self.calls.lock().unwrap().clone()
    }

    pub fn argvs(&self) -> Vec<Vec<String>> {
        self.calls().iter().map(Cmd::argv).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, cmd: &Cmd) -> Result<CommandOutput, BuildError> {
        self.calls.lock().unwrap().push(cmd.clone());

        let argv = cmd.argv();
        let Some(rule) = self.rules.iter().find(|rule| (rule.matcher)(&argv)) else {
            return Ok(CommandOutput::default());
        };

        if let Some(effect) = &rule.effect {
            effect();
        }

        match &rule.reply {
            Reply::Ok(output) => Ok(output.clone()),
            Reply::Fail { code, stderr } => Err(BuildError::CommandExecution {
                argv,
                code: Some(*code),
                stderr: stderr.clone(),
            }),
        }
    }
}

/// Matches argv whose program ends with `name` (so full paths match too).
pub fn program_is(name: &'static str) -> impl Fn(&[String]) -> bool + Send + Sync + 'static {
    move |argv: &[String]| {
        argv.first()
            .is_some_and(|program| program == name || program.ends_with(&format!("/{name}")))
    }
}

/// Matches `make` invocations that select a defconfig.
pub fn is_defconfig(argv: &[String]) -> bool {
    program_is("make")(argv) && argv.iter().any(|arg| arg.ends_with("_defconfig"))
}

/// Matches the plain `make` build step.
pub fn is_kernel_build(argv: &[String]) -> bool {
    program_is("make")(argv) && !argv.iter().any(|arg| arg.ends_with("_defconfig"))
}
