use super::types::{ToolCallRecord, Transcript};
use crate::error::{EvalError, Result};
use crate::tools::ToolSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Drives an agent through one round and returns its transcript
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, prompt: &str, tools: &ToolSet, max_steps: u32) -> Result<Transcript>;
}

/// A tool call as recorded, before it is replayed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedCall {
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// One recorded agent turn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordedRound {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<RecordedCall>,
    /// Simulates an agent crash for this round
    #[serde(default)]
    pub error: Option<String>,
}

/// Replays recorded rounds in order, re-invoking the recorded tool calls
/// against the live tool set
pub struct ReplayAgent {
    rounds: Vec<RecordedRound>,
    cursor: Mutex<usize>,
}

impl ReplayAgent {
    pub fn new(rounds: Vec<RecordedRound>) -> Self {
        Self {
            rounds,
            cursor: Mutex::new(0),
        }
    }

    /// Load recorded rounds from a JSON-lines file
    pub fn from_jsonl(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let mut rounds = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            rounds.push(serde_json::from_str(&line)?);
        }
        info!("Loaded {} recorded rounds from {:?}", rounds.len(), path);
        Ok(Self::new(rounds))
    }
}

#[async_trait]
impl AgentExecutor for ReplayAgent {
    fn name(&self) -> &str {
        "replay"
    }

    async fn execute(&self, _prompt: &str, tools: &ToolSet, max_steps: u32) -> Result<Transcript> {
        let recorded = {
            let mut cursor = self.cursor.lock().await;
            let recorded = self.rounds.get(*cursor).cloned().ok_or_else(|| {
                EvalError::Agent(format!(
                    "no recorded transcript left (replayed {} rounds)",
                    *cursor
                ))
            })?;
            *cursor += 1;
            recorded
        };

        if let Some(reason) = recorded.error {
            return Err(EvalError::Agent(reason));
        }

        let step_budget = max_steps as usize;
        if recorded.tool_calls.len() > step_budget {
            warn!(
                "Recorded round has {} tool calls, truncating to max_steps {}",
                recorded.tool_calls.len(),
                step_budget
            );
        }

        let mut tool_calls = Vec::new();
        for call in recorded.tool_calls.into_iter().take(step_budget) {
            debug!("Replaying tool call {}", call.tool);
            let record = match tools.call(&call.tool, call.args.clone()).await {
                Ok(result) => ToolCallRecord {
                    tool: call.tool,
                    args: call.args,
                    result: Some(result),
                    error: None,
                },
                Err(e) => ToolCallRecord {
                    tool: call.tool,
                    args: call.args,
                    result: None,
                    error: Some(e.to_string()),
                },
            };
            tool_calls.push(record);
        }

        Ok(Transcript {
            output: recorded.output,
            tool_calls,
            ..Default::default()
        })
    }
}

/// Runs an external agent process: prompt on stdin, completion on stdout
pub struct CommandAgent {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandAgent {
    pub fn new(command: &str, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.to_string(),
            args,
            timeout,
        }
    }
}

#[async_trait]
impl AgentExecutor for CommandAgent {
    fn name(&self) -> &str {
        &self.command
    }

    async fn execute(&self, prompt: &str, tools: &ToolSet, max_steps: u32) -> Result<Transcript> {
        info!("Running agent command: {} {:?}", self.command, self.args);

        let mut child = tokio::process::Command::new(&self.command)
            .args(&self.args)
            .env("MEDALLION_TOOLS", tools.names().join(","))
            .env("MEDALLION_MAX_STEPS", max_steps.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EvalError::Agent(format!("failed to spawn {}: {}", self.command, e)))?;

        // Feed the prompt concurrently with the wait so the timeout covers both
        let stdin = child.stdin.take();
        let prompt = prompt.as_bytes().to_vec();
        let feed_prompt = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(&prompt).await {
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!("Agent closed stdin before reading the whole prompt");
                    Ok(())
                }
                other => other,
            }
        };

        let run = async {
            let (fed, output) = tokio::join!(feed_prompt, child.wait_with_output());
            fed?;
            output
        };

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                EvalError::Agent(format!(
                    "{} timed out after {}s",
                    self.command,
                    self.timeout.as_secs_f64()
                ))
            })?
            .map_err(|e| EvalError::Agent(format!("{} failed: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EvalError::Agent(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        Ok(Transcript::from_output(
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::phase_tools;
    use serde_json::json;

    fn recorded(output: &str, calls: Vec<RecordedCall>) -> RecordedRound {
        RecordedRound {
            output: Some(output.to_string()),
            tool_calls: calls,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_replay_invokes_tools() {
        let agent = ReplayAgent::new(vec![recorded(
            "done",
            vec![RecordedCall {
                tool: "load_numerai_data".to_string(),
                args: json!({ "dataset": "validation" }),
            }],
        )]);

        let transcript = agent.execute("prompt", &phase_tools(1), 10).await.unwrap();
        assert_eq!(transcript.output_text(), "done");
        assert_eq!(transcript.tool_calls.len(), 1);
        assert!(transcript.tool_calls[0]
            .result
            .as_deref()
            .unwrap()
            .contains("validation dataset"));
    }

    #[tokio::test]
    async fn test_replay_records_unavailable_tool_as_error() {
        let agent = ReplayAgent::new(vec![recorded(
            "done",
            vec![RecordedCall {
                tool: "store_memory".to_string(),
                args: json!({ "content": "x", "round_num": 1 }),
            }],
        )]);

        let transcript = agent.execute("prompt", &phase_tools(2), 10).await.unwrap();
        assert!(!transcript.tool_calls[0].succeeded());
    }

    #[tokio::test]
    async fn test_replay_respects_max_steps() {
        let call = RecordedCall {
            tool: "load_numerai_data".to_string(),
            args: json!({ "dataset": "training" }),
        };
        let agent = ReplayAgent::new(vec![recorded("x", vec![call.clone(), call.clone(), call])]);

        let transcript = agent.execute("prompt", &phase_tools(1), 2).await.unwrap();
        assert_eq!(transcript.tool_calls.len(), 2);
    }

    #[tokio::test]
    async fn test_replay_exhausted_and_failing_rounds() {
        let agent = ReplayAgent::new(vec![RecordedRound {
            error: Some("model crashed".to_string()),
            ..Default::default()
        }]);
        let tools = phase_tools(1);

        let first = agent.execute("p", &tools, 5).await.unwrap_err();
        assert!(first.to_string().contains("model crashed"));

        let second = agent.execute("p", &tools, 5).await.unwrap_err();
        assert!(matches!(second, EvalError::Agent(_)));
    }

    #[test]
    fn test_replay_from_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.jsonl");
        std::fs::write(
            &path,
            "{\"output\": \"round one\"}\n\n{\"output\": \"round two\", \"tool_calls\": []}\n",
        )
        .unwrap();

        let agent = ReplayAgent::from_jsonl(&path).unwrap();
        assert_eq!(agent.rounds.len(), 2);
    }

    fn sh(script: &str, timeout: Duration) -> CommandAgent {
        CommandAgent::new("sh", vec!["-c".to_string(), script.to_string()], timeout)
    }

    /// Larger than a pipe buffer, so the write blocks until the child reads
    fn large_prompt() -> String {
        "x".repeat(512 * 1024)
    }

    #[tokio::test]
    async fn test_command_echoes_prompt() {
        let agent = sh("cat", Duration::from_secs(10));
        let transcript = agent
            .execute("train a model\n", &phase_tools(1), 5)
            .await
            .unwrap();
        assert_eq!(transcript.output_text(), "train a model");
        assert!(transcript.tool_calls.is_empty());
        assert_eq!(agent.name(), "sh");
    }

    #[tokio::test]
    async fn test_command_sees_tools_and_step_budget() {
        let agent = sh(
            "cat > /dev/null; echo \"$MEDALLION_TOOLS|$MEDALLION_MAX_STEPS\"",
            Duration::from_secs(10),
        );
        let transcript = agent.execute("prompt", &phase_tools(2), 12).await.unwrap();
        assert_eq!(
            transcript.output_text(),
            "load_numerai_data,write_note,store_kv,train_model,simulate_submission,update_bankroll|12"
        );
    }

    #[tokio::test]
    async fn test_command_nonzero_exit_fails_round() {
        let agent = sh("echo boom >&2; exit 3", Duration::from_secs(10));
        let err = agent.execute("prompt", &phase_tools(1), 5).await.unwrap_err();
        match err {
            EvalError::Agent(message) => assert!(message.contains("boom"), "{}", message),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_command_spawn_failure_is_agent_error() {
        let agent = CommandAgent::new(
            "medallion-no-such-agent",
            Vec::new(),
            Duration::from_secs(1),
        );
        let err = agent.execute("prompt", &phase_tools(1), 5).await.unwrap_err();
        assert!(matches!(err, EvalError::Agent(_)));
    }

    #[tokio::test]
    async fn test_command_timeout_while_prompt_unread() {
        let agent = sh("sleep 4; echo answer", Duration::from_millis(500));
        let started = std::time::Instant::now();
        let err = agent
            .execute(&large_prompt(), &phase_tools(1), 5)
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(3));
        match err {
            EvalError::Agent(message) => assert!(message.contains("timed out"), "{}", message),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_command_answer_without_reading_prompt() {
        let agent = sh("exec 0<&-; echo answer", Duration::from_secs(10));
        let transcript = agent
            .execute(&large_prompt(), &phase_tools(1), 5)
            .await
            .unwrap();
        assert_eq!(transcript.output_text(), "answer");
    }
}
