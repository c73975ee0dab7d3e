//! Support ticket and chat repository for database operations.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::entities::{
    ChatConversation, ChatMessage, NewTicket, Role, SupportTicket, TicketFilter, TicketStatus,
    TicketUpdate,
};
use crate::ids::{format_timestamp, new_public_id, now_timestamp, ticket_number};
use crate::types::{DatabaseError, DatabaseResult, Page};

const TICKET_COLUMNS: &str = "SELECT t.id, t.public_id, t.ticket_number, t.requester_id, p.public_id AS requester_public_id, p.full_name AS requester_name, t.requester_role, t.subject, t.description, t.category, t.priority, t.status, t.assigned_to, t.created_at, t.updated_at, t.resolved_at FROM support_tickets t JOIN profiles p ON p.id = t.requester_id";

const MESSAGE_COLUMNS: &str = "SELECT m.id, m.conversation_id, m.sender_id, p.public_id AS sender_public_id, p.full_name AS sender_name, m.sender_role, m.content, m.created_at FROM chat_messages m JOIN profiles p ON p.id = m.sender_id";

/// Repository for support tickets and the conversations attached to them
#[derive(Clone)]
pub struct SupportRepository {
    pool: SqlitePool,
}

impl SupportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a ticket together with its conversation. The ticket description
    /// becomes the first message of the thread.
    pub async fn create_ticket(&self, ticket: &NewTicket) -> DatabaseResult<SupportTicket> {
        let now = Utc::now();
        let created_at = format_timestamp(now);
        let public_id = new_public_id();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO support_tickets (public_id, ticket_number, requester_id, requester_role, subject, description, category, priority, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'open', ?, ?)",
        )
        .bind(&public_id)
        .bind(ticket_number(now))
        .bind(ticket.requester_id)
        .bind(ticket.requester_role)
        .bind(&ticket.subject)
        .bind(&ticket.description)
        .bind(&ticket.category)
        .bind(ticket.priority)
        .bind(&created_at)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;
        let ticket_id = result.last_insert_rowid();

        let conversation = sqlx::query(
            "INSERT INTO chat_conversations (ticket_id, requester_id, subject, status, created_at, updated_at) VALUES (?, ?, ?, 'active', ?, ?)",
        )
        .bind(ticket_id)
        .bind(ticket.requester_id)
        .bind(&ticket.subject)
        .bind(&created_at)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO chat_messages (conversation_id, sender_id, sender_role, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(conversation.last_insert_rowid())
        .bind(ticket.requester_id)
        .bind(ticket.requester_role)
        .bind(&ticket.description)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_ticket_by_id(ticket_id)
            .await?
            .ok_or_else(|| DatabaseError::InternalError("created ticket not found".into()))
    }

    pub async fn find_ticket_by_id(&self, id: i64) -> DatabaseResult<Option<SupportTicket>> {
        let ticket =
            sqlx::query_as::<_, SupportTicket>(&format!("{TICKET_COLUMNS} WHERE t.id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(ticket)
    }

    pub async fn find_ticket(&self, public_id: &str) -> DatabaseResult<Option<SupportTicket>> {
        let ticket = sqlx::query_as::<_, SupportTicket>(&format!(
            "{TICKET_COLUMNS} WHERE t.public_id = ?"
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ticket)
    }

    /// List tickets matching the filter, most recently updated first
    pub async fn list_tickets(
        &self,
        filter: &TicketFilter,
        page: Page,
    ) -> DatabaseResult<Vec<SupportTicket>> {
        let mut builder = QueryBuilder::<Sqlite>::new(TICKET_COLUMNS);
        builder.push(" WHERE 1 = 1");

        if let Some(requester_id) = filter.requester_id {
            builder.push(" AND t.requester_id = ").push_bind(requester_id);
        }
        if let Some(status) = filter.status {
            builder.push(" AND t.status = ").push_bind(status);
        }
        if let Some(priority) = filter.priority {
            builder.push(" AND t.priority = ").push_bind(priority);
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            builder
                .push(" AND (lower(t.subject) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(t.ticket_number) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(p.full_name) LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        builder
            .push(" ORDER BY t.updated_at DESC, t.id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let tickets = builder
            .build_query_as::<SupportTicket>()
            .fetch_all(&self.pool)
            .await?;
        Ok(tickets)
    }

    /// Apply an admin update. Moving to `resolved` stamps `resolved_at` once.
    pub async fn update_ticket(
        &self,
        id: i64,
        update: &TicketUpdate,
    ) -> DatabaseResult<SupportTicket> {
        let now = now_timestamp();
        let result = sqlx::query(
            "UPDATE support_tickets SET
                status = COALESCE(?1, status),
                priority = COALESCE(?2, priority),
                assigned_to = COALESCE(?3, assigned_to),
                resolved_at = CASE WHEN ?1 = 'resolved' THEN COALESCE(resolved_at, ?4) ELSE resolved_at END,
                updated_at = ?4
             WHERE id = ?5",
        )
        .bind(update.status)
        .bind(update.priority)
        .bind(update.assigned_to)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("support ticket"));
        }

        self.find_ticket_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("support ticket"))
    }

    /// Conversations attached to a ticket, oldest first
    pub async fn conversations_for_ticket(
        &self,
        ticket_id: i64,
    ) -> DatabaseResult<Vec<ChatConversation>> {
        let conversations = sqlx::query_as::<_, ChatConversation>(
            "SELECT id, ticket_id, requester_id, subject, status, created_at, updated_at FROM chat_conversations WHERE ticket_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(conversations)
    }

    /// Messages of the given conversations, in no guaranteed order
    pub async fn messages_for_conversations(
        &self,
        conversation_ids: &[i64],
    ) -> DatabaseResult<Vec<ChatMessage>> {
        if conversation_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(MESSAGE_COLUMNS);
        builder.push(" WHERE m.conversation_id IN (");
        let mut separated = builder.separated(", ");
        for id in conversation_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let messages = builder
            .build_query_as::<ChatMessage>()
            .fetch_all(&self.pool)
            .await?;
        Ok(messages)
    }

    /// Append a message to the ticket's primary conversation, creating one if the
    /// ticket has none. With `take_into_progress` an `open` ticket becomes
    /// `in_progress`; any other status is left alone.
    pub async fn add_message(
        &self,
        ticket: &SupportTicket,
        sender_id: i64,
        sender_role: Role,
        content: &str,
        take_into_progress: bool,
    ) -> DatabaseResult<ChatMessage> {
        let now = now_timestamp();
        let mut tx = self.pool.begin().await?;

        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM chat_conversations WHERE ticket_id = ? ORDER BY created_at ASC, id ASC LIMIT 1",
        )
        .bind(ticket.id)
        .fetch_optional(&mut *tx)
        .await?;

        let conversation_id = match existing {
            Some((id,)) => {
                sqlx::query("UPDATE chat_conversations SET updated_at = ? WHERE id = ?")
                    .bind(&now)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                id
            }
            None => sqlx::query(
                "INSERT INTO chat_conversations (ticket_id, requester_id, subject, status, created_at, updated_at) VALUES (?, ?, ?, 'active', ?, ?)",
            )
            .bind(ticket.id)
            .bind(ticket.requester_id)
            .bind(&ticket.subject)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid(),
        };

        let message = sqlx::query(
            "INSERT INTO chat_messages (conversation_id, sender_id, sender_role, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(sender_role)
        .bind(content)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        // Only an open ticket moves to in_progress; a concurrent resolve wins.
        sqlx::query(
            "UPDATE support_tickets SET status = CASE WHEN ? AND status = 'open' THEN ? ELSE status END, updated_at = ? WHERE id = ?",
        )
        .bind(take_into_progress)
        .bind(TicketStatus::InProgress)
        .bind(&now)
        .bind(ticket.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let message = sqlx::query_as::<_, ChatMessage>(&format!("{MESSAGE_COLUMNS} WHERE m.id = ?"))
            .bind(message.last_insert_rowid())
            .fetch_one(&self.pool)
            .await?;
        Ok(message)
    }

    /// Tickets that still need attention (`open` or `in_progress`)
    pub async fn count_unresolved(&self) -> DatabaseResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM support_tickets WHERE status IN ('open', 'in_progress')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
