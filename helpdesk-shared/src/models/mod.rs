/// Database models for the help desk
///
/// Each module owns one table (or a small family of tables) and the SQL that
/// reads and writes it.
///
/// # Models
///
/// - `user`: accounts and roles
/// - `ticket_category`: admin-maintained ticket categories
/// - `ticket`: tickets, list filters, status changes, dashboard counters
/// - `ticket_comment`: ticket conversation
/// - `assignment`: ticket and computer assignment history
/// - `computer_asset`: computer inventory
/// - `computer_maintenance`: maintenance log
/// - `computer_software`: installed software
///
/// # Example
///
/// ```no_run
/// use helpdesk_shared::models::ticket::{CreateTicket, Ticket, TicketPriority, TicketType};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, category: Uuid, me: Uuid) -> Result<(), sqlx::Error> {
/// let ticket = Ticket::create(&pool, CreateTicket {
///     title: "VPN keeps dropping".to_string(),
///     description: "Disconnects every 10 minutes".to_string(),
///     ticket_type: TicketType::Incident,
///     priority: TicketPriority::High,
///     category_id: category,
///     requestor_id: me,
///     created_by: me,
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod assignment;
pub mod computer_asset;
pub mod computer_maintenance;
pub mod computer_software;
pub mod ticket;
pub mod ticket_category;
pub mod ticket_comment;
pub mod user;
