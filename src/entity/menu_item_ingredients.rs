use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "menu_item_ingredients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub inventory_item_id: Uuid,
    pub amount_used_per_item: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::menu_items::Entity",
        from = "Column::MenuItemId",
        to = "super::menu_items::Column::Id"
    )]
    MenuItems,
    #[sea_orm(
        belongs_to = "super::inventory_items::Entity",
        from = "Column::InventoryItemId",
        to = "super::inventory_items::Column::Id"
    )]
    InventoryItems,
}

impl Related<super::menu_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuItems.def()
    }
}

impl Related<super::inventory_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
