//! In-memory fakes for the tool runner (testing only)
//!
//! [`ScriptedRunner`] satisfies [`ToolRunner`] without launching anything:
//! every invocation is recorded and answered from a list of scripted rules.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, SiteCheckError};
use crate::runner::{ToolInvocation, ToolOutput, ToolRunner};

#[derive(Debug, Clone)]
enum Reply {
    Exit { code: i32, output: String },
    Missing,
    Hang,
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    reply: Reply,
}

/// Records invocations and answers them from scripted rules.
///
/// A rule matches when its pattern is a substring of the invocation's
/// command line; the most recently added matching rule wins. Invocations
/// with no matching rule exit 0 with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<ToolInvocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit with `code` for matching invocations.
    pub fn exit_with(self, pattern: &str, code: i32, output: &str) -> Self {
        self.push(pattern, Reply::Exit {
            code,
            output: output.to_string(),
        });
        self
    }

    /// Fail to spawn matching invocations as if the program did not exist.
    pub fn missing(self, pattern: &str) -> Self {
        self.push(pattern, Reply::Missing);
        self
    }

    /// Never complete matching invocations.
    pub fn hang(self, pattern: &str) -> Self {
        self.push(pattern, Reply::Hang);
        self
    }

    fn push(&self, pattern: &str, reply: Reply) {
        self.rules.lock().unwrap().push(Rule {
            pattern: pattern.to_string(),
            reply,
        });
    }

    /// Every invocation seen so far, in call order.
    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Invocations whose command line contains `pattern`.
    pub fn invocations_matching(&self, pattern: &str) -> Vec<ToolInvocation> {
        self.invocations()
            .into_iter()
            .filter(|i| i.command_line().contains(pattern))
            .collect()
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        let command_line = invocation.command_line();
        let reply = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| command_line.contains(&r.pattern))
            .map(|r| r.reply.clone());

        match reply {
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Missing) => Err(SiteCheckError::ToolSpawn {
                program: invocation.program.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
            Some(Reply::Exit { code, output }) => Ok(ToolOutput {
                name: invocation.name.clone(),
                exit_code: code,
                output,
                duration_ms: 0,
                success: code == 0,
            }),
            None => Ok(ToolOutput {
                name: invocation.name.clone(),
                exit_code: 0,
                output: String::new(),
                duration_ms: 0,
                success: true,
            }),
        }
    }
}
