//! CRM operations (customers, orders, interactions).
//!
//! These methods are the storage interface the pipeline terminates in; the
//! pipeline does not own their durability semantics, it just calls them.

use crate::error::{DbError, Result};
use crate::types::{Customer, InteractionRecord, NewInteraction, NewOrder, OrderRecord};
use crate::LedgerDb;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl LedgerDb {
    // ========================================================================
    // Customers
    // ========================================================================

    /// Exact-name lookup against both the formal and the contact name.
    pub async fn find_customer_by_name(&self, name: &str) -> Result<Option<Customer>> {
        let row = sqlx::query(
            "SELECT * FROM lt_customers WHERE company_name = ? OR client_name = ? LIMIT 1",
        )
        .bind(name)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_customer(&r)).transpose()
    }

    /// Get a customer by id.
    pub async fn get_customer(&self, id: i64) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT * FROM lt_customers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_customer(&r)).transpose()
    }

    /// Find a customer by sender name, creating an unverified placeholder
    /// when no match exists. The placeholder reuses the sender name for both
    /// name fields so later manual edits can split them.
    pub async fn find_or_create_customer(&self, name: &str) -> Result<Customer> {
        if let Some(existing) = self.find_customer_by_name(name).await? {
            return Ok(existing);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO lt_customers
                (company_name, client_name, phone, industry, sales_rep, auto_created, created_at)
            VALUES (?, ?, '', '메신저유입', 'Automated', 1, ?)
            "#,
        )
        .bind(name)
        .bind(name)
        .bind(Self::now_millis())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_customer(id)
            .await?
            .ok_or_else(|| DbError::not_found(format!("Customer {id} vanished after insert")))
    }

    // ========================================================================
    // Orders
    // ========================================================================

    /// Insert an order row, returning its id.
    pub async fn record_order(&self, order: &NewOrder) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO lt_orders
                (customer_id, order_date, product_name, quantity,
                 total_amount, deposit_amount, note, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.customer_id)
        .bind(order.order_date.to_string())
        .bind(order.product_name.as_deref())
        .bind(order.quantity)
        .bind(order.total_amount)
        .bind(order.deposit_amount)
        .bind(order.note.as_deref())
        .bind(Self::now_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// All orders for a customer, newest first.
    pub async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query("SELECT * FROM lt_orders WHERE customer_id = ? ORDER BY id DESC")
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_order).collect()
    }

    // ========================================================================
    // Interactions
    // ========================================================================

    /// Insert an interaction row, returning its id.
    pub async fn record_interaction(&self, interaction: &NewInteraction) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO lt_interactions
                (customer_id, content, next_action_date, status, log_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(interaction.customer_id)
        .bind(&interaction.content)
        .bind(interaction.next_action_date.map(|d| d.to_string()))
        .bind(&interaction.status)
        .bind(interaction.log_date.to_string())
        .bind(Self::now_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// All interactions for a customer, newest first.
    pub async fn interactions_for_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<InteractionRecord>> {
        let rows =
            sqlx::query("SELECT * FROM lt_interactions WHERE customer_id = ? ORDER BY id DESC")
                .bind(customer_id)
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_interaction).collect()
    }

    /// Mark the customer's most recent interaction as done, clearing its
    /// follow-up date. Returns false when the customer has no interactions.
    pub async fn complete_latest_interaction(&self, customer_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE lt_interactions
            SET status = '완료', next_action_date = NULL
            WHERE id = (
                SELECT id FROM lt_interactions
                WHERE customer_id = ?
                ORDER BY id DESC
                LIMIT 1
            )
            "#,
        )
        .bind(customer_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_customer(row: &SqliteRow) -> Result<Customer> {
    Ok(Customer {
        id: row.get("id"),
        company_name: row.get("company_name"),
        client_name: row.get("client_name"),
        phone: row.get("phone"),
        industry: row.get("industry"),
        sales_rep: row.get("sales_rep"),
        auto_created: row.get::<i64, _>("auto_created") != 0,
    })
}

fn row_to_order(row: &SqliteRow) -> Result<OrderRecord> {
    Ok(OrderRecord {
        id: row.get("id"),
        customer_id: row.get("customer_id"),
        order_date: parse_stored_date(&row.get::<String, _>("order_date"))?,
        product_name: row.get("product_name"),
        quantity: row.get("quantity"),
        total_amount: row.get("total_amount"),
        deposit_amount: row.get("deposit_amount"),
        note: row.get("note"),
    })
}

fn row_to_interaction(row: &SqliteRow) -> Result<InteractionRecord> {
    let next_action: Option<String> = row.get("next_action_date");
    Ok(InteractionRecord {
        id: row.get("id"),
        customer_id: row.get("customer_id"),
        content: row.get("content"),
        next_action_date: next_action.as_deref().map(parse_stored_date).transpose()?,
        status: row.get("status"),
        log_date: parse_stored_date(&row.get::<String, _>("log_date"))?,
    })
}

fn parse_stored_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| DbError::corrupt(format!("Bad stored date: {s}")))
}
