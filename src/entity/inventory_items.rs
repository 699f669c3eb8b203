use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub ingredient_name: String,
    /// Baseline restock quantity; the low-stock threshold is a share of it.
    pub supplied_amount: i64,
    pub available_quantity: i64,
    pub unit: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::restaurants::Entity",
        from = "Column::RestaurantId",
        to = "super::restaurants::Column::Id"
    )]
    Restaurants,
    #[sea_orm(has_many = "super::supply_logs::Entity")]
    SupplyLogs,
}

impl Related<super::restaurants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Restaurants.def()
    }
}

impl Related<super::supply_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplyLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
