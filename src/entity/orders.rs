use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub menu_item_id: Uuid,
    pub user_id: Uuid,
    pub customer_name: String,
    pub phone: String,
    pub table_number: i32,
    pub quantity: i32,
    pub total_price: i64,
    pub order_status: String,
    pub payment_method: Option<String>,
    pub payment_status: String,
    pub amount_paid: i64,
    #[sea_orm(unique)]
    pub tx_ref: String,
    pub transaction_id: Option<String>,
    pub payment_date: Option<DateTimeWithTimeZone>,
    pub placed_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::menu_items::Entity",
        from = "Column::MenuItemId",
        to = "super::menu_items::Column::Id"
    )]
    MenuItems,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::menu_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
