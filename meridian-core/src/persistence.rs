//! Persistence contracts (§4.6): trade journal, order repository,
//! position snapshot store, audit log. Core relies only on the
//! semantic behaviour described in the spec (append-only, idempotent
//! upsert, queryable by date/status/symbol) — no concrete durable
//! backend ships here.
//!
//! The trade journal is grounded on the teacher's
//! `execution/journal.rs::AsyncJournal`: a bounded `crossbeam::channel`
//! feeding a background writer thread that appends `serde_json` lines,
//! with `record` doing a non-blocking `try_send` (an HFT engine must
//! never stall the hot path on disk I/O) and `Drop` taking the sender
//! before joining the thread so the writer's `recv()` loop terminates.
//! The audit log's severity/category shape is grounded on
//! `monitoring/alerts.rs::{AlertSeverity, AlertCategory}`.

use crossbeam::channel::{bounded, Sender};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crate::domain::{Order, Position, Symbol, Trade};

/// Append-only trade journal (§4.6 "Trade journal").
pub trait TradeJournal: Send + Sync {
    fn record(&self, trade: &Trade);
    fn flush(&self) -> std::io::Result<()>;
    /// All trades recorded on the given epoch day (`epoch_ns / 86_400e9`).
    fn read_by_date(&self, epoch_day: i64) -> std::io::Result<Vec<Trade>>;
    /// Stop accepting new records and join the writer thread. Idempotent;
    /// `Drop` calls this if the caller never does.
    fn close(&self) -> std::io::Result<()>;
}

/// Background-thread journal writing newline-delimited JSON, mirroring
/// the teacher's `AsyncJournal`.
pub struct AsyncTradeJournal {
    sender: parking_lot::Mutex<Option<Sender<Trade>>>,
    handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
    path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct JournalEntry {
    recorded_at_epoch_ns: u64,
    trade: Trade,
}

impl AsyncTradeJournal {
    pub fn new(path: PathBuf) -> Self {
        let (sender, receiver) = bounded::<Trade>(4096);
        let writer_path = path.clone();
        let handle = thread::spawn(move || {
            let mut file = match OpenOptions::new().create(true).append(true).open(&writer_path) {
                Ok(f) => f,
                Err(err) => {
                    tracing::error!(path = ?writer_path, %err, "failed to open trade journal");
                    return;
                }
            };
            for trade in receiver {
                let entry = JournalEntry { recorded_at_epoch_ns: trade.executed_at, trade };
                match serde_json::to_string(&entry) {
                    Ok(json) => {
                        if let Err(err) = writeln!(file, "{json}") {
                            tracing::error!(%err, "failed to write trade journal entry");
                        }
                    }
                    Err(err) => tracing::error!(%err, "failed to serialize trade journal entry"),
                }
            }
            if let Err(err) = file.flush() {
                tracing::error!(%err, "failed to flush trade journal on shutdown");
            }
        });
        Self { sender: parking_lot::Mutex::new(Some(sender)), handle: parking_lot::Mutex::new(Some(handle)), path }
    }

    /// Epoch day (UTC) a trade's `executed_at` (epoch ns) falls on.
    fn epoch_day_of(executed_at: u64) -> i64 {
        (executed_at / 86_400_000_000_000) as i64
    }
}

impl TradeJournal for AsyncTradeJournal {
    /// Non-blocking; a full buffer drops the record with a warning
    /// rather than stalling the caller.
    fn record(&self, trade: &Trade) {
        if let Some(sender) = self.sender.lock().as_ref() {
            if let Err(err) = sender.try_send(trade.clone()) {
                tracing::warn!(%err, "trade journal buffer full, dropping entry");
            }
        }
    }

    fn flush(&self) -> std::io::Result<()> {
        Ok(())
    }

    /// Re-reads the journal file and filters by day; the writer thread
    /// holds no in-memory copy, so this is a full file scan.
    fn read_by_date(&self, epoch_day: i64) -> std::io::Result<Vec<Trade>> {
        let file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        let reader = std::io::BufReader::new(file);
        let mut trades = Vec::new();
        for line in std::io::BufRead::lines(reader) {
            let line = line?;
            let entry: JournalEntry = match serde_json::from_str(&line) {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!(%err, "skipping unparseable trade journal line");
                    continue;
                }
            };
            if Self::epoch_day_of(entry.recorded_at_epoch_ns) == epoch_day {
                trades.push(entry.trade);
            }
        }
        Ok(trades)
    }

    fn close(&self) -> std::io::Result<()> {
        let _ = self.sender.lock().take();
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

impl Drop for AsyncTradeJournal {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Order repository (§4.6): upsert by client id, lookup by client or
/// venue id, list recent/active/by symbol/status/date.
pub trait OrderRepository: Send + Sync {
    fn upsert(&self, order: &Order);
    fn find_by_client_id(&self, client_id: u64) -> Option<Order>;
    fn find_by_venue_id(&self, venue_order_id: &str) -> Option<Order>;
    fn list_active(&self) -> Vec<Order>;
    fn list_by_symbol(&self, symbol: &Symbol) -> Vec<Order>;
    fn list_by_status(&self, status: crate::domain::OrderStatus) -> Vec<Order>;
    /// Orders last updated on the given epoch day (`updated_at / 86_400e9`).
    fn list_by_date(&self, epoch_day: i64) -> Vec<Order>;
    fn list_recent(&self, limit: usize) -> Vec<Order>;
}

/// Position snapshot store (§4.6): snapshot positions at a point in
/// time, query end-of-day.
pub trait PositionSnapshotStore: Send + Sync {
    fn snapshot(&self, epoch_ns: u64, positions: &[Position]);
    fn end_of_day(&self, epoch_day: i64) -> Vec<Position>;
}

/// Audit event severity, mirroring the teacher's `AlertSeverity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Audit event category, mirroring the teacher's `AlertCategory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditCategory {
    Risk,
    Order,
    Position,
    System,
}

/// A classified audit event (§4.6 "Audit log").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub epoch_ns: u64,
    pub category: AuditCategory,
    pub severity: AuditSeverity,
    pub message: String,
    pub details: Option<String>,
}

pub trait AuditLog: Send + Sync {
    fn record(&self, event: AuditEvent);
    /// Filterable read by minimum severity and, optionally, category.
    fn read(&self, min_severity: AuditSeverity, category: Option<AuditCategory>) -> Vec<AuditEvent>;
}

/// In-memory audit log for tests and environments without a durable
/// backend wired in.
#[derive(Default)]
pub struct InMemoryAuditLog {
    events: parking_lot::Mutex<Vec<AuditEvent>>,
}

impl AuditLog for InMemoryAuditLog {
    fn record(&self, event: AuditEvent) {
        self.events.lock().push(event);
    }

    fn read(&self, min_severity: AuditSeverity, category: Option<AuditCategory>) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.severity >= min_severity)
            .filter(|e| category.map(|c| c == e.category).unwrap_or(true))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Side, Venue};
    use std::io::{BufRead, BufReader};
    use std::sync::atomic::{AtomicU64, Ordering};

    fn scratch_path(name: &str) -> PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("meridian-journal-test-{name}-{n}.jsonl"))
    }

    fn test_trade() -> Trade {
        Trade {
            symbol: Symbol::new("AAPL", Venue::Nasdaq),
            side: Side::Buy,
            quantity: 10,
            price: 150_00,
            client_order_id: 1,
            exchange_trade_id: Some("T-1".to_string()),
            executed_at: 42,
            commission: 0,
        }
    }

    #[test]
    fn journal_writes_are_readable_after_drop() {
        let path = scratch_path("writes");
        {
            let journal = AsyncTradeJournal::new(path.clone());
            journal.record(&test_trade());
        }
        let file = std::fs::File::open(&path).unwrap();
        let lines: Vec<String> = BufReader::new(file).lines().collect::<Result<_, _>>().unwrap();
        assert_eq!(lines.len(), 1);
        let entry: JournalEntry = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(entry.trade.client_order_id, 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn audit_log_filters_by_severity_and_category() {
        let log = InMemoryAuditLog::default();
        log.record(AuditEvent { epoch_ns: 1, category: AuditCategory::Risk, severity: AuditSeverity::Warning, message: "m".into(), details: None });
        log.record(AuditEvent { epoch_ns: 2, category: AuditCategory::Order, severity: AuditSeverity::Info, message: "m".into(), details: None });
        let warnings = log.read(AuditSeverity::Warning, None);
        assert_eq!(warnings.len(), 1);
        let risk_only = log.read(AuditSeverity::Info, Some(AuditCategory::Risk));
        assert_eq!(risk_only.len(), 1);
    }
}
