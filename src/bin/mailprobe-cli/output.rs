use anyhow::{Result, bail};
use mailprobe_lib::{SmtpEvent, Verification};

/// Une ligne de sortie: le résultat, ou l'erreur d'analyse de l'adresse.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[cfg_attr(feature = "with-serde", serde(untagged))]
pub enum OutputRow {
    Checked(Verification),
    Rejected { input: String, error: String },
}

impl OutputRow {
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Checked(v) => v.reachable == mailprobe_lib::ReachabilityVerdict::No,
            Self::Rejected { .. } => true,
        }
    }
}

pub fn emit(rows: &[OutputRow], format: &str) -> Result<()> {
    match format {
        "human" => {
            for row in rows {
                print_human(row);
            }
        }
        "json" => {
            #[cfg(feature = "with-serde")]
            {
                println!("{}", serde_json::to_string_pretty(rows)?);
            }
            #[cfg(not(feature = "with-serde"))]
            {
                bail!("format=json nécessite la feature 'with-serde'");
            }
        }
        other => bail!("format inconnu '{other}', utilisez human|json"),
    }
    Ok(())
}

fn print_human(row: &OutputRow) {
    let v = match row {
        OutputRow::Checked(v) => v,
        OutputRow::Rejected { input, error } => {
            println!("[INVALID] {input} :: {error}");
            return;
        }
    };

    println!("[{}] {}", v.reachable.as_str().to_uppercase(), v.email);
    if let Some(disposable) = v.disposable {
        println!("  disposable: {disposable}");
    }
    if !v.mx_hosts.is_empty() {
        let hosts: Vec<String> = v.mx_hosts.iter().map(ToString::to_string).collect();
        println!("  mx: {}", hosts.join(", "));
    }
    if let Some(smtp) = &v.smtp {
        println!("  smtp: {smtp}");
    }
    for attempt in &v.attempts {
        println!("  {}: {}", attempt.host, attempt.outcome);
        for event in &attempt.transcript {
            match event {
                SmtpEvent::Sent { command, .. } => println!("    > {command}"),
                SmtpEvent::Received { reply, .. } => println!("    < {reply}"),
                SmtpEvent::Error { stage, message } => println!("    ! {stage:?}: {message}"),
            }
        }
    }
}
