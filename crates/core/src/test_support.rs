//! Scripted command runner for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use xcpilot_api::{CommandOutput, CommandRequest, CommandRunner, PilotError, Result};

#[derive(Debug, Clone)]
pub enum Reply {
    Ok(String),
    Fail(String),
    Timeout,
}

struct Rule {
    pattern: String,
    replies: VecDeque<Reply>,
}

/// Replies to commands by substring match, first matching rule wins.
///
/// A rule with several replies hands them out in order and then keeps repeating the
/// last one. Unmatched commands fail with exit code 127.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<CommandRequest>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, pattern: &str, stdout: &str) -> Self {
        self.script(pattern, vec![Reply::Ok(stdout.to_string())])
    }

    pub fn fail(self, pattern: &str, stderr: &str) -> Self {
        self.script(pattern, vec![Reply::Fail(stderr.to_string())])
    }

    pub fn script(self, pattern: &str, replies: Vec<Reply>) -> Self {
        self.rules.lock().unwrap().push(Rule {
            pattern: pattern.to_string(),
            replies: replies.into(),
        });
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.command.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<CommandRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.contains(pattern))
            .count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn execute(&self, request: CommandRequest) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(request.clone());

        let reply = {
            let mut rules = self.rules.lock().unwrap();
            rules
                .iter_mut()
                .find(|rule| request.command.contains(&rule.pattern))
                .and_then(|rule| {
                    if rule.replies.len() > 1 {
                        rule.replies.pop_front()
                    } else {
                        rule.replies.front().cloned()
                    }
                })
        };

        match reply {
            Some(Reply::Ok(stdout)) => Ok(CommandOutput::new(stdout, "")),
            Some(Reply::Fail(stderr)) => Err(PilotError::Process {
                command: request.command,
                code: Some(1),
                stdout: String::new(),
                stderr,
            }),
            Some(Reply::Timeout) => Err(PilotError::Timeout {
                command: request.command,
                timeout_ms: request.timeout.as_millis() as u64,
            }),
            None => Err(PilotError::Process {
                command: request.command,
                code: Some(127),
                stdout: String::new(),
                stderr: "no scripted reply".to_string(),
            }),
        }
    }
}
