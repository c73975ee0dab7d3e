use std::collections::HashSet;

use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use unieats_database::{
    ChatConversation, ChatMessage, NewNotification, NewTicket, Page, Profile, ProfileFilter,
    ProfileRepository, ProfileStatus, Role, SupportRepository, SupportTicket, TicketFilter,
    TicketUpdate,
};
use utoipa::ToSchema;

use super::{audit, error::ServiceError, notifications};
use crate::routes::models::{CreateTicketRequest, TicketsQuery, UpdateTicketRequest};
use crate::util::clean;

const MAX_SUBJECT_LEN: usize = 200;
const MAX_MESSAGE_LEN: usize = 5_000;
const DEFAULT_CATEGORY: &str = "general";

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TicketThread {
    pub ticket: SupportTicket,
    /// Every message of the ticket's conversations, oldest first.
    pub responses: Vec<ChatMessage>,
}

/// Keep the messages that belong to `conversations` and order them by creation
/// time, breaking ties by message id.
pub fn assemble_thread(
    conversations: &[ChatConversation],
    messages: Vec<ChatMessage>,
) -> Vec<ChatMessage> {
    let ids: HashSet<i64> = conversations.iter().map(|c| c.id).collect();
    let mut responses: Vec<_> = messages
        .into_iter()
        .filter(|m| ids.contains(&m.conversation_id))
        .collect();
    responses.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    responses
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), ServiceError> {
    if value.is_empty() {
        return Err(ServiceError::bad_request(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(ServiceError::bad_request(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

pub async fn create_ticket(
    pool: &SqlitePool,
    requester: &Profile,
    req: CreateTicketRequest,
) -> Result<TicketThread, ServiceError> {
    let subject = req.subject.trim().to_string();
    let description = req.description.trim().to_string();
    check_length("Subject", &subject, MAX_SUBJECT_LEN)?;
    check_length("Description", &description, MAX_MESSAGE_LEN)?;

    let repo = SupportRepository::new(pool.clone());
    let ticket = repo
        .create_ticket(&NewTicket {
            requester_id: requester.id,
            requester_role: requester.role,
            subject,
            description,
            category: clean(req.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            priority: req.priority.unwrap_or_default(),
        })
        .await?;

    tracing::info!(
        ticket = %ticket.ticket_number,
        requester = %requester.public_id,
        "support ticket opened"
    );

    load_thread(&repo, ticket).await
}

pub async fn list_tickets(
    pool: &SqlitePool,
    viewer: &Profile,
    query: TicketsQuery,
) -> Result<Vec<SupportTicket>, ServiceError> {
    let filter = TicketFilter {
        requester_id: (viewer.role != Role::Admin).then_some(viewer.id),
        status: query.status,
        priority: query.priority,
        search: clean(query.search),
    };
    let tickets = SupportRepository::new(pool.clone())
        .list_tickets(&filter, Page::new(query.limit, query.offset))
        .await?;
    Ok(tickets)
}

/// A ticket is visible to its requester and to admins.
async fn visible_ticket(
    repo: &SupportRepository,
    viewer: &Profile,
    public_id: &str,
) -> Result<SupportTicket, ServiceError> {
    repo.find_ticket(public_id)
        .await?
        .filter(|t| viewer.role == Role::Admin || t.requester_id == viewer.id)
        .ok_or_else(|| ServiceError::not_found("Support ticket not found"))
}

async fn load_thread(
    repo: &SupportRepository,
    ticket: SupportTicket,
) -> Result<TicketThread, ServiceError> {
    let conversations = repo.conversations_for_ticket(ticket.id).await?;
    let ids: Vec<i64> = conversations.iter().map(|c| c.id).collect();
    let messages = repo.messages_for_conversations(&ids).await?;
    Ok(TicketThread {
        ticket,
        responses: assemble_thread(&conversations, messages),
    })
}

pub async fn get_ticket(
    pool: &SqlitePool,
    viewer: &Profile,
    public_id: &str,
) -> Result<TicketThread, ServiceError> {
    let repo = SupportRepository::new(pool.clone());
    let ticket = visible_ticket(&repo, viewer, public_id).await?;
    load_thread(&repo, ticket).await
}

/// Post a reply to a ticket thread. An admin answering an open ticket takes it
/// into progress.
pub async fn reply(
    pool: &SqlitePool,
    sender: &Profile,
    public_id: &str,
    content: &str,
) -> Result<ChatMessage, ServiceError> {
    let content = content.trim();
    check_length("Message", content, MAX_MESSAGE_LEN)?;

    let repo = SupportRepository::new(pool.clone());
    let ticket = visible_ticket(&repo, sender, public_id).await?;
    if !ticket.status.accepts_replies() {
        return Err(ServiceError::bad_request("Closed tickets cannot receive replies"));
    }

    let from_admin = sender.role == Role::Admin && sender.id != ticket.requester_id;
    let message = repo
        .add_message(&ticket, sender.id, sender.role, content, from_admin)
        .await?;

    if from_admin {
        notifications::notify(
            pool,
            NewNotification::new(
                ticket.requester_id,
                "support_reply",
                "New reply from support",
                format!("Support replied to ticket {}", ticket.ticket_number),
            )
            .related("support_ticket", ticket.public_id.clone()),
        )
        .await;
    } else {
        for admin_id in ticket_watchers(pool, &ticket).await? {
            notifications::notify(
                pool,
                NewNotification::new(
                    admin_id,
                    "support_reply",
                    "New reply on a ticket",
                    format!("{} replied to ticket {}", sender.full_name, ticket.ticket_number),
                )
                .related("support_ticket", ticket.public_id.clone()),
            )
            .await;
        }
    }

    Ok(message)
}

/// The assignee of a ticket, or every active admin while it is unassigned.
async fn ticket_watchers(
    pool: &SqlitePool,
    ticket: &SupportTicket,
) -> Result<Vec<i64>, ServiceError> {
    if let Some(assignee) = ticket.assigned_to {
        return Ok(vec![assignee]);
    }
    let filter = ProfileFilter {
        role: Some(Role::Admin),
        status: Some(ProfileStatus::Active),
        search: None,
    };
    let admins = ProfileRepository::new(pool.clone())
        .list(&filter, Page::new(Some(Page::MAX_LIMIT), None))
        .await?;
    Ok(admins.into_iter().map(|admin| admin.id).collect())
}

pub async fn update_ticket(
    pool: &SqlitePool,
    admin: &Profile,
    public_id: &str,
    req: UpdateTicketRequest,
) -> Result<SupportTicket, ServiceError> {
    let repo = SupportRepository::new(pool.clone());
    let ticket = repo
        .find_ticket(public_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Support ticket not found"))?;

    let assigned_to = match clean(req.assigned_to) {
        Some(assignee) => {
            let profile = ProfileRepository::new(pool.clone())
                .find_by_public_id(&assignee)
                .await?
                .filter(|p| p.role == Role::Admin)
                .ok_or_else(|| ServiceError::bad_request("Tickets can only be assigned to admins"))?;
            Some(profile.id)
        }
        None => None,
    };

    if req.status.is_none() && req.priority.is_none() && assigned_to.is_none() {
        return Err(ServiceError::bad_request("Nothing to update"));
    }

    let updated = repo
        .update_ticket(
            ticket.id,
            &TicketUpdate {
                status: req.status,
                priority: req.priority,
                assigned_to,
            },
        )
        .await?;

    audit::record(
        pool,
        admin,
        "support_ticket.updated",
        "support_ticket",
        &updated.public_id,
        json!({
            "ticket_number": updated.ticket_number,
            "from_status": ticket.status,
            "status": updated.status,
            "priority": updated.priority,
            "assigned_to": updated.assigned_to,
        }),
    )
    .await;

    if updated.status != ticket.status {
        notifications::notify(
            pool,
            NewNotification::new(
                updated.requester_id,
                "support_status",
                "Ticket updated",
                format!(
                    "Ticket {} is now {}",
                    updated.ticket_number,
                    updated.status.as_str().replace('_', " ")
                ),
            )
            .related("support_ticket", updated.public_id.clone()),
        )
        .await;
    }

    Ok(updated)
}
