use sea_orm::entity::prelude::*;

/// One customer's reservation of a dining table for `[starts_at, ends_at)`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub table_id: Uuid,
    pub user_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub starts_at: DateTimeWithTimeZone,
    pub ends_at: DateTimeWithTimeZone,
    pub reservation_status: String,
    pub payment_method: Option<String>,
    pub payment_status: String,
    pub amount_paid: i64,
    #[sea_orm(unique)]
    pub tx_ref: String,
    pub transaction_id: Option<String>,
    pub payment_date: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dining_tables::Entity",
        from = "Column::TableId",
        to = "super::dining_tables::Column::Id"
    )]
    DiningTables,
}

impl Related<super::dining_tables::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DiningTables.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
