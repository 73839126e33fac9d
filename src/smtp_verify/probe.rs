use std::time::Duration;

use tokio::time::{Instant, sleep_until, timeout};

use crate::cancel::CancelToken;
use crate::dialer::Dial;

use super::error::StepError;
use super::options::ProbeOptions;
use super::session::SmtpSession;
use super::types::{
    AttemptStage as Stage, ErrorKind, HostProbe, ProbeOutcome, ProbeTarget, SmtpEvent,
};
use super::util::{self, random_local_part};

/// How long a clean `RSET`/`QUIT` may take once the probe itself is done.
const QUIT_GRACE: Duration = Duration::from_secs(2);
/// Budget for the best-effort `QUIT` after a timeout or cancellation.
const ABORT_GRACE: Duration = Duration::from_millis(100);

/// Runs the probe sequence against a single host.
///
/// The whole attempt (dial, greeting, `MAIL FROM`, `RCPT TO`, catch-all
/// probe) is bounded by `options.timeout` and interrupted by `cancel`. The
/// connection is always closed before returning, and a [`HostProbe`] is
/// produced on every path. No other host is tried here.
pub async fn probe_host<D>(
    dialer: &D,
    host: &str,
    target: &ProbeTarget,
    options: &ProbeOptions,
    cancel: &CancelToken,
) -> HostProbe
where
    D: Dial + ?Sized,
{
    let mut run = ProbeRun::new(host);
    let deadline = Instant::now() + options.timeout;

    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(StepError::new(ErrorKind::Cancelled, "probe cancelled")),
        () = sleep_until(deadline) => Err(StepError::new(
            ErrorKind::Timeout,
            format!("probe exceeded {:?}", options.timeout),
        )),
        res = run.drive(dialer, target, options) => res,
    };

    let interrupted = match result {
        Ok(()) => false,
        Err(err) => {
            let interrupted = err.is_interruption();
            run.fail(err);
            interrupted
        }
    };
    run.close(interrupted).await;
    run.finish()
}

struct ProbeRun {
    host: String,
    outcome: ProbeOutcome,
    events: Vec<SmtpEvent>,
    session: Option<SmtpSession>,
    stage: Stage,
    transaction_open: bool,
}

impl ProbeRun {
    fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            outcome: ProbeOutcome::default(),
            events: Vec::new(),
            session: None,
            stage: Stage::Connect,
            transaction_open: false,
        }
    }

    async fn drive<D>(
        &mut self,
        dialer: &D,
        target: &ProbeTarget,
        options: &ProbeOptions,
    ) -> Result<(), StepError>
    where
        D: Dial + ?Sized,
    {
        let Self {
            host,
            outcome,
            events,
            session: slot,
            stage,
            transaction_open,
        } = self;

        let stream = match dialer.dial(host, options.port).await {
            Ok(stream) => stream,
            Err(err) => {
                events.push(SmtpEvent::Error {
                    stage: Stage::Connect,
                    message: err.to_string(),
                });
                return Err(StepError::new(err.kind(), err.to_string()));
            }
        };
        outcome.connected = true;
        let session = slot.insert(SmtpSession::new(host, stream));

        *stage = Stage::Greeting;
        let banner = session.read_banner(Stage::Greeting).await?;
        if !banner.is_positive_completion() {
            return Err(StepError::reply(ErrorKind::GreetingRejected, &banner));
        }

        let helo = options.helo_name();
        *stage = Stage::Ehlo;
        let ehlo = session.command(&format!("EHLO {helo}"), Stage::Ehlo).await?;
        if !ehlo.is_positive_completion() {
            *stage = Stage::Helo;
            let fallback = session.command(&format!("HELO {helo}"), Stage::Helo).await?;
            if !fallback.is_positive_completion() {
                return Err(StepError::reply(ErrorKind::GreetingRejected, &fallback));
            }
        }
        outcome.helo_ok = true;

        *stage = Stage::MailFrom;
        let sender = options.envelope_sender(&target.domain);
        let mail_reply = session
            .command(&format!("MAIL FROM:<{sender}>"), Stage::MailFrom)
            .await?;
        if mail_reply.is_permanent_failure() {
            return Err(StepError::reply(ErrorKind::SenderRejected, &mail_reply));
        }
        if mail_reply.is_transient_failure() {
            return Err(StepError::reply(ErrorKind::SenderDeferred, &mail_reply));
        }
        if !mail_reply.is_positive_completion() {
            return Err(StepError::reply(ErrorKind::Protocol, &mail_reply));
        }
        outcome.mail_from_ok = true;
        *transaction_open = true;

        *stage = Stage::RcptTo;
        let rcpt_reply = session
            .command(&format!("RCPT TO:<{}>", target.address()), Stage::RcptTo)
            .await?;
        outcome.disabled |= util::is_disabled(&rcpt_reply);
        outcome.full_inbox |= util::is_full_inbox(&rcpt_reply);
        if !rcpt_reply.is_positive_completion() {
            let kind = util::recipient_error_kind(&rcpt_reply);
            return Err(StepError::reply(kind, &rcpt_reply));
        }
        outcome.rcpt_ok = true;

        if options.catch_all_check {
            *stage = Stage::CatchAll;
            let mut alias = random_local_part();
            while alias.eq_ignore_ascii_case(&target.local_part) {
                alias = random_local_part();
            }
            let reply = session
                .command(&format!("RCPT TO:<{alias}@{}>", target.domain), Stage::CatchAll)
                .await?;
            outcome.catch_all = reply.is_positive_completion();
        }

        Ok(())
    }

    fn fail(&mut self, err: StepError) {
        if err.is_interruption() {
            let message = err.text.clone();
            match self.session.as_mut() {
                Some(session) => session.record_error(self.stage, message),
                None => self.events.push(SmtpEvent::Error {
                    stage: self.stage,
                    message,
                }),
            }
        }
        self.outcome.last_error = Some(err.kind);
        self.outcome.last_error_text = err.text;
    }

    /// Sends `RSET`/`QUIT` and shuts the stream down. Errors here only land
    /// in the transcript.
    async fn close(&mut self, interrupted: bool) {
        let transaction_open = self.transaction_open;
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if interrupted {
            if timeout(ABORT_GRACE, session.write_line("QUIT", Stage::Quit))
                .await
                .is_err()
            {
                session.record_error(Stage::Quit, "QUIT not sent before abort");
            }
        } else {
            let goodbye = async {
                if transaction_open {
                    session.command("RSET", Stage::Rset).await.ok();
                }
                session.command("QUIT", Stage::Quit).await.ok();
            };
            if timeout(QUIT_GRACE, goodbye).await.is_err() {
                session.record_error(Stage::Quit, "no reply to QUIT within grace period");
            }
        }

        timeout(ABORT_GRACE, session.shutdown()).await.ok();
    }

    fn finish(mut self) -> HostProbe {
        let mut transcript = self.events;
        if let Some(session) = self.session.as_mut() {
            transcript.extend(session.take_transcript());
        }
        HostProbe {
            host: self.host,
            outcome: self.outcome,
            transcript,
        }
    }
}
