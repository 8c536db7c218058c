use chrono::Utc;
use marquee_models::{Premiere, Ticket, TicketCode, TicketFormat, TicketPolicy};
use marquee_store::{PremiereStore, RedeemOutcome, Store, TicketStore};
use rand::Rng;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use crate::{CoreError, CoreResult};

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const GROUP_LEN: usize = 4;
const MAX_CODE_ATTEMPTS: usize = 8;

/// Random admission code in the requested shape
pub fn generate_code<R: Rng>(format: TicketFormat, rng: &mut R) -> String {
    match format {
        TicketFormat::Grouped => {
            let mut group = || -> String {
                (0..GROUP_LEN)
                    .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
                    .collect()
            };
            let first = group();
            let second = group();
            format!("{}-{}", first, second)
        }
        TicketFormat::Hex => {
            let bytes: [u8; 3] = rng.gen();
            format!("CHK-{}", hex::encode_upper(bytes))
        }
    }
}

fn fresh_code(format: TicketFormat) -> CoreResult<TicketCode> {
    let raw = generate_code(format, &mut rand::thread_rng());
    Ok(TicketCode::parse(&raw)?)
}

pub struct TicketService {
    store: Arc<dyn Store>,
    format: TicketFormat,
    max_batch: u32,
    // Keeps the seat-cap check and the inserts of one batch together
    generate_lock: Mutex<()>,
}

impl TicketService {
    pub fn new(store: Arc<dyn Store>, format: TicketFormat, max_batch: u32) -> Self {
        Self {
            store,
            format,
            max_batch,
            generate_lock: Mutex::new(()),
        }
    }

    async fn premiere(&self, premiere_id: &str) -> CoreResult<Premiere> {
        self.store
            .get_premiere(premiere_id)
            .await?
            .ok_or_else(|| CoreError::not_found("premiere", premiere_id))
    }

    /// Create `count` new unique codes for the premiere
    pub async fn generate(&self, premiere_id: &str, count: u32) -> CoreResult<Vec<Ticket>> {
        if count == 0 || count > self.max_batch {
            return Err(CoreError::validation(format!(
                "count must be between 1 and {}",
                self.max_batch
            )));
        }
        let premiere = self.premiere(premiere_id).await?;

        let _guard = self.generate_lock.lock().await;

        if premiere.policy == TicketPolicy::Limited {
            if let Some(max_seats) = premiere.max_seats {
                let existing = self.store.count_tickets(premiere_id).await?;
                let remaining = (max_seats as u64).saturating_sub(existing);
                if count as u64 > remaining {
                    return Err(CoreError::Conflict(format!(
                        "Only {} of {} seats remaining",
                        remaining, max_seats
                    )));
                }
            }
        }

        let mut tickets = Vec::with_capacity(count as usize);
        for _ in 0..count {
            tickets.push(self.insert_unique(premiere_id).await?);
        }

        info!(
            operation = "generate_tickets",
            premiere_id,
            count = tickets.len(),
            format = ?self.format,
            "Generated tickets"
        );
        Ok(tickets)
    }

    async fn insert_unique(&self, premiere_id: &str) -> CoreResult<Ticket> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let ticket = Ticket::new(premiere_id.to_string(), fresh_code(self.format)?, Utc::now());
            if self.store.insert_ticket_if_absent(ticket.clone()).await? {
                return Ok(ticket);
            }
            warn!(premiere_id, attempt, "Ticket code collision, retrying");
        }
        Err(CoreError::Conflict(
            "Could not generate a unique ticket code".to_string(),
        ))
    }

    /// One-shot redemption of a code typed by a viewer
    pub async fn redeem(&self, premiere_id: &str, raw_code: &str, user_id: &str) -> CoreResult<Ticket> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(CoreError::validation("userId required"));
        }
        self.premiere(premiere_id).await?;
        let code = TicketCode::parse(raw_code).map_err(|_| CoreError::TicketInvalid)?;

        match self.store.redeem_ticket(premiere_id, &code, user_id, Utc::now()).await? {
            RedeemOutcome::Redeemed(ticket) => {
                info!(operation = "redeem_ticket", premiere_id, code = %code, "Ticket redeemed");
                Ok(ticket)
            }
            RedeemOutcome::AlreadyUsed => Err(CoreError::TicketAlreadyUsed),
            RedeemOutcome::NotFound => Err(CoreError::TicketInvalid),
        }
    }

    /// Admin override of the used flag, in either direction
    pub async fn set_used(&self, premiere_id: &str, raw_code: &str, used: bool) -> CoreResult<Ticket> {
        let code = TicketCode::parse(raw_code)?;
        let ticket = self
            .store
            .set_ticket_used(premiere_id, &code, used, Utc::now())
            .await?
            .ok_or_else(|| CoreError::not_found("ticket", code.to_string()))?;
        info!(operation = "override_ticket", premiere_id, code = %code, used, "Ticket updated by admin");
        Ok(ticket)
    }

    pub async fn list(&self, premiere_id: &str) -> CoreResult<Vec<Ticket>> {
        self.premiere(premiere_id).await?;
        Ok(self.store.list_tickets(premiere_id).await?)
    }
}

/// Write tickets as CSV with a header row
pub fn write_csv<W: Write>(tickets: &[Ticket], writer: W) -> CoreResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["premiere_id", "code", "used", "used_by", "used_at", "created_at"])?;
    for ticket in tickets {
        csv.write_record([
            ticket.premiere_id.clone(),
            ticket.code.to_string(),
            ticket.used.to_string(),
            ticket.used_by.clone().unwrap_or_default(),
            ticket.used_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            ticket.created_at.to_rfc3339(),
        ])?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}
