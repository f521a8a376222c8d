//! Line-oriented operator commands.
//!
//! The presentation layer is external, so the daemon takes its input events
//! as text lines (stdin by default):
//!
//! ```text
//! toggle <spot>     reserve or release the spot with that 1-based number
//! remove-last       delete the last configured space
//! remove-id <id>    delete a space by its stable id
//! status            print per-spot status and counts
//! ```

use std::io::BufRead;
use std::thread::JoinHandle;

use anyhow::{anyhow, Result};

use crate::booking::ToggleOutcome;
use crate::session::{Session, StatusReport};
use crate::space::SpaceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCommand {
    /// 1-based spot number, as shown on the overlay.
    Toggle(usize),
    RemoveLast,
    Remove(SpaceId),
    Status,
}

impl ControlCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let verb = parts
            .next()
            .ok_or_else(|| anyhow!("empty command"))?
            .to_ascii_lowercase();
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(anyhow!("too many arguments for '{}'", verb));
        }
        let cmd = match (verb.as_str(), arg) {
            ("toggle", Some(n)) => {
                let number: usize = n
                    .parse()
                    .map_err(|_| anyhow!("spot number must be a positive integer"))?;
                if number == 0 {
                    return Err(anyhow!("spot numbers start at 1"));
                }
                ControlCommand::Toggle(number)
            }
            ("remove-id", Some(id)) => {
                let id = id.trim_start_matches("space#");
                let id: u64 = id
                    .parse()
                    .map_err(|_| anyhow!("space id must be an integer"))?;
                ControlCommand::Remove(SpaceId(id))
            }
            ("remove-last", None) => ControlCommand::RemoveLast,
            ("status", None) => ControlCommand::Status,
            ("toggle", None) | ("remove-id", None) => {
                return Err(anyhow!("'{}' needs an argument", verb))
            }
            (_, Some(_)) if matches!(verb.as_str(), "remove-last" | "status") => {
                return Err(anyhow!("'{}' takes no argument", verb))
            }
            _ => return Err(anyhow!("unknown command '{}'", verb)),
        };
        Ok(cmd)
    }
}

/// Run one command against the session and describe the result.
pub fn apply(session: &Session, cmd: ControlCommand) -> Result<String> {
    match cmd {
        ControlCommand::Toggle(number) => {
            let outcome = session.toggle_space(number - 1)?;
            Ok(match outcome {
                ToggleOutcome::Reserved => format!("spot {} reserved", number),
                ToggleOutcome::Released => format!("spot {} released", number),
                ToggleOutcome::Rejected(reason) => format!("spot {}: {}", number, reason),
            })
        }
        ControlCommand::RemoveLast => Ok(match session.remove_last_space()? {
            Some(space) => format!("removed {}", space.id),
            None => "no spaces to remove".to_string(),
        }),
        ControlCommand::Remove(id) => Ok(match session.remove_space(id)? {
            Some((index, _)) => format!("removed spot {} ({})", index + 1, id),
            None => format!("no such space {}", id),
        }),
        ControlCommand::Status => Ok(format_report(&session.report()?)),
    }
}

pub fn format_report(report: &StatusReport) -> String {
    let mut out = String::new();
    for spot in &report.spots {
        out.push_str(&format!("spot {} ({}): {}\n", spot.number, spot.id, spot.status));
    }
    out.push_str(&format!(
        "total={} occupied={} available={}",
        report.counts.total, report.counts.occupied, report.counts.available
    ));
    out
}

/// Read commands line by line until EOF, printing each reply.
pub fn run_control<R: BufRead>(session: &Session, input: R) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match ControlCommand::parse(&line).and_then(|cmd| apply(session, cmd)) {
            Ok(reply) => println!("{}", reply),
            Err(e) => log::warn!("control: {:#}", e),
        }
    }
    Ok(())
}

/// Serve commands from stdin on a background thread.
pub fn spawn_stdin_control(session: Session) -> Result<JoinHandle<()>> {
    let handle = std::thread::Builder::new()
        .name("control".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            if let Err(e) = run_control(&session, stdin.lock()) {
                log::error!("control input stopped: {:#}", e);
            }
        })?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::Polygon;
    use crate::storage::InMemorySpaceStore;
    use std::sync::Arc;

    fn session(n: i32) -> (Session, Arc<InMemorySpaceStore>) {
        let polygons = (0..n)
            .map(|i| Polygon::from_pairs(&[(i * 10, 0), (i * 10 + 5, 0), (i * 10, 5)]))
            .collect();
        let store = Arc::new(InMemorySpaceStore::new(polygons));
        (Session::open(store.clone()).unwrap(), store)
    }

    #[test]
    fn parses_commands() {
        assert_eq!(ControlCommand::parse("toggle 3").unwrap(), ControlCommand::Toggle(3));
        assert_eq!(ControlCommand::parse("  STATUS ").unwrap(), ControlCommand::Status);
        assert_eq!(
            ControlCommand::parse("remove-last").unwrap(),
            ControlCommand::RemoveLast
        );
        assert_eq!(
            ControlCommand::parse("remove-id space#4").unwrap(),
            ControlCommand::Remove(SpaceId(4))
        );
        assert_eq!(
            ControlCommand::parse("remove-id 7").unwrap(),
            ControlCommand::Remove(SpaceId(7))
        );
    }

    #[test]
    fn rejects_malformed_commands() {
        for line in ["", "toggle", "toggle 0", "toggle x", "status now", "park 1", "toggle 1 2", "remove-id"] {
            assert!(ControlCommand::parse(line).is_err(), "{line:?} should fail");
        }
    }

    #[test]
    fn toggle_uses_one_based_numbers() {
        let (session, _) = session(2);
        assert_eq!(
            apply(&session, ControlCommand::Toggle(2)).unwrap(),
            "spot 2 reserved"
        );
        let id = session.id_at(1).unwrap().unwrap();
        assert!(session.is_reserved(id).unwrap());
        assert_eq!(
            apply(&session, ControlCommand::Toggle(2)).unwrap(),
            "spot 2 released"
        );
        assert_eq!(
            apply(&session, ControlCommand::Toggle(9)).unwrap(),
            "spot 9: no such spot"
        );
    }

    #[test]
    fn remove_commands_persist() {
        let (session, store) = session(3);
        apply(&session, ControlCommand::RemoveLast).unwrap();
        assert_eq!(store.snapshot().len(), 2);

        let first = session.id_at(0).unwrap().unwrap();
        let reply = apply(&session, ControlCommand::Remove(first)).unwrap();
        assert!(reply.starts_with("removed spot 1"));
        assert_eq!(store.snapshot().len(), 1);

        let reply = apply(&session, ControlCommand::Remove(first)).unwrap();
        assert!(reply.starts_with("no such space"));
    }

    #[test]
    fn status_lists_every_spot() {
        let (session, _) = session(2);
        let text = apply(&session, ControlCommand::Status).unwrap();
        assert!(text.contains("spot 1 (space#0): free"));
        assert!(text.ends_with("total=2 occupied=0 available=2"));
    }

    #[test]
    fn run_control_skips_bad_lines() {
        let (session, store) = session(2);
        let input = "bogus\n\ntoggle 1\nremove-last\n";
        run_control(&session, input.as_bytes()).unwrap();
        assert_eq!(store.snapshot().len(), 1);
        let id = session.id_at(0).unwrap().unwrap();
        assert!(session.is_reserved(id).unwrap());
    }
}
