//! Demo datasets available in a fresh session.

use chrono::NaiveDate;

use crate::model::{Column, DataType, Relation, RelationId};
use crate::value::CellValue;

/// `orders_q1` (`t1`) and `customers_master` (`t2`), in that order.
pub fn seed_relations() -> Vec<Relation> {
    vec![orders_q1(), customers_master()]
}

fn orders_q1() -> Relation {
    let columns = vec![
        Column::new("c1", "order_id", DataType::Integer),
        Column::new("c2", "customer_id", DataType::Integer),
        Column::new("c3", "total_amount", DataType::Float),
        Column::new("c4", "order_date", DataType::Date),
        Column::new("c5", "status", DataType::String),
    ];
    let rows = vec![
        order(1001, 55, 240.50, date(2023, 1, 15), "Shipped"),
        order(1002, 55, 120.00, date(2023, 2, 10), "Processing"),
        order(1003, 12, 890.00, date(2023, 3, 1), "Shipped"),
        order(1004, 99, 45.00, date(2023, 3, 5), "Cancelled"),
        order(1005, 12, 1200.50, date(2023, 3, 10), "Shipped"),
    ];
    Relation::from_parts(RelationId::new("t1"), "orders_q1".into(), columns, rows)
}

fn customers_master() -> Relation {
    let columns = vec![
        Column::new("c6", "customer_id", DataType::Integer),
        Column::new("c7", "full_name", DataType::String),
        Column::new("c8", "email", DataType::String),
        Column::new("c9", "segment", DataType::String),
    ];
    let rows = vec![
        customer(55, "Alice Johnson", "alice@example.com", "Retail"),
        customer(12, "Bob Smith", "bob@corp.com", "Corporate"),
        customer(99, "Charlie Brown", "charlie@test.com", "Retail"),
    ];
    Relation::from_parts(
        RelationId::new("t2"),
        "customers_master".into(),
        columns,
        rows,
    )
}

fn order(id: i64, customer: i64, total: f64, date: CellValue, status: &str) -> Vec<CellValue> {
    vec![id.into(), customer.into(), total.into(), date, status.into()]
}

fn customer(id: i64, name: &str, email: &str, segment: &str) -> Vec<CellValue> {
    vec![id.into(), name.into(), email.into(), segment.into()]
}

fn date(year: i32, month: u32, day: u32) -> CellValue {
    NaiveDate::from_ymd_opt(year, month, day).into()
}
