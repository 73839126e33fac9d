use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

use crate::dialer::BoxedStream;

use super::error::SessionError;
use super::types::{AttemptStage, SmtpEvent, SmtpReply};

/// Upper bound on continuation lines accepted in a single reply.
const MAX_REPLY_LINES: usize = 128;
/// Longest reply line accepted, terminator included (RFC 5321 allows 512).
pub(crate) const MAX_LINE_LEN: usize = 4096;

pub(crate) struct SmtpSession {
    host: String,
    stream: BufReader<BoxedStream>,
    transcript: Vec<SmtpEvent>,
}

impl SmtpSession {
    pub(crate) fn new(host: &str, stream: BoxedStream) -> Self {
        Self {
            host: host.to_string(),
            stream: BufReader::new(stream),
            transcript: Vec::new(),
        }
    }

    /// Reads one reply without sending anything (the banner).
    pub(crate) async fn read_banner(
        &mut self,
        stage: AttemptStage,
    ) -> Result<SmtpReply, SessionError> {
        let result = self.read_reply().await;
        self.record_result(stage, &result);
        result
    }

    /// Sends `command` and waits for the complete reply.
    pub(crate) async fn command(
        &mut self,
        command: &str,
        stage: AttemptStage,
    ) -> Result<SmtpReply, SessionError> {
        self.write_line(command, stage).await?;
        let result = self.read_reply().await;
        self.record_result(stage, &result);
        result
    }

    /// Writes `command` without waiting for a reply. A command holding CR or
    /// LF is refused before anything reaches the wire.
    pub(crate) async fn write_line(
        &mut self,
        command: &str,
        stage: AttemptStage,
    ) -> Result<(), SessionError> {
        if command.contains(['\r', '\n']) {
            let err = SessionError::Malformed(format!("line break in command {command:?}"));
            self.record_error(stage, err.to_string());
            return Err(err);
        }
        tracing::debug!(host = %self.host, ?stage, command, "smtp >");
        self.transcript.push(SmtpEvent::Sent {
            stage,
            command: command.to_string(),
        });
        let mut line = command.as_bytes().to_vec();
        line.extend_from_slice(b"\r\n");
        let stream = self.stream.get_mut();
        let written = match stream.write_all(&line).await {
            Ok(()) => stream.flush().await,
            Err(err) => Err(err),
        };
        written.map_err(|err| {
            let err = SessionError::from(err);
            self.record_error(stage, err.to_string());
            err
        })
    }

    pub(crate) async fn shutdown(&mut self) {
        self.stream.get_mut().shutdown().await.ok();
    }

    pub(crate) fn record_error(&mut self, stage: AttemptStage, message: impl Into<String>) {
        self.transcript.push(SmtpEvent::Error {
            stage,
            message: message.into(),
        });
    }

    pub(crate) fn take_transcript(&mut self) -> Vec<SmtpEvent> {
        std::mem::take(&mut self.transcript)
    }

    fn record_result(&mut self, stage: AttemptStage, result: &Result<SmtpReply, SessionError>) {
        match result {
            Ok(reply) => {
                tracing::debug!(host = %self.host, ?stage, code = reply.code, "smtp <");
                self.transcript.push(SmtpEvent::Received {
                    stage,
                    reply: reply.clone(),
                });
            }
            Err(err) => self.record_error(stage, err.to_string()),
        }
    }

    async fn read_reply(&mut self) -> Result<SmtpReply, SessionError> {
        let mut code = None;
        let mut message_lines = Vec::new();
        loop {
            let mut raw = Vec::new();
            let bytes = (&mut self.stream)
                .take(MAX_LINE_LEN as u64)
                .read_until(b'\n', &mut raw)
                .await?;
            if bytes == 0 {
                return Err(SessionError::Closed);
            }
            if bytes == MAX_LINE_LEN && raw.last() != Some(&b'\n') {
                return Err(SessionError::Malformed(format!(
                    "reply line exceeds {MAX_LINE_LEN} bytes"
                )));
            }
            let (parsed_code, continuation, text) = parse_reply_line(&raw)?;
            match code {
                Some(existing) if existing != parsed_code => {
                    return Err(SessionError::Malformed(format!(
                        "inconsistent SMTP reply codes: {existing} vs {parsed_code}"
                    )));
                }
                Some(_) => {}
                None => code = Some(parsed_code),
            }
            message_lines.push(text);
            if !continuation {
                break;
            }
            if message_lines.len() >= MAX_REPLY_LINES {
                return Err(SessionError::Malformed(format!(
                    "reply exceeds {MAX_REPLY_LINES} lines"
                )));
            }
        }
        Ok(SmtpReply {
            code: code.ok_or_else(|| SessionError::Malformed("missing status code".into()))?,
            message: message_lines.join("\n"),
        })
    }
}

/// Splits `250-text` / `250 text` into code, continuation flag and text.
pub(crate) fn parse_reply_line(raw: &[u8]) -> Result<(u16, bool, String), SessionError> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\r', '\n']);
    if line.len() < 3 || !line.is_char_boundary(3) {
        return Err(SessionError::Malformed(format!("invalid SMTP reply: '{line}'")));
    }
    let code_part = &line[..3];
    let code = code_part
        .parse::<u16>()
        .ok()
        .filter(|code| (100..600).contains(code))
        .ok_or_else(|| SessionError::Malformed(format!("invalid SMTP status code: '{code_part}'")))?;
    let continuation = line.as_bytes().get(3).copied() == Some(b'-');
    let text = line.get(4..).unwrap_or_default().to_string();
    Ok((code, continuation, text))
}
