use sea_orm::{
    sea_query::SimpleExpr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect,
};
use std::collections::HashSet;

use crate::entities::{
    employee, product, role_permission::{self, Permission}, shop, shop_inventory, user,
};
use crate::middleware::logging::ApiError;

/// The admin caller: a superuser, an owner of shops, an employee of one shop,
/// or any mix of ownership and employment.
#[derive(Clone, Debug)]
pub struct Actor {
    pub user: user::Model,
    pub owned_shops: Vec<i32>,
    pub employee: Option<employee::Model>,
    pub employee_permissions: HashSet<Permission>,
}

/// Rows an actor may see: everything, or rows tied to these shops.
#[derive(Clone, Debug, PartialEq)]
pub enum Scope {
    All,
    Shops(Vec<i32>),
}

impl Scope {
    pub fn condition<C: ColumnTrait>(&self, column: C) -> Option<SimpleExpr> {
        match self {
            Scope::All => None,
            Scope::Shops(ids) => Some(column.is_in(ids.clone())),
        }
    }

    pub fn apply<Q: QueryFilter, C: ColumnTrait>(&self, query: Q, column: C) -> Q {
        match self.condition(column) {
            Some(condition) => query.filter(condition),
            None => query,
        }
    }

    pub fn contains(&self, shop_id: Option<i32>) -> bool {
        match self {
            Scope::All => true,
            Scope::Shops(ids) => shop_id.is_some_and(|id| ids.contains(&id)),
        }
    }
}

impl Actor {
    /// Loads the actor for an authenticated user. Only staff get one.
    pub async fn load<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Actor, ApiError> {
        let user = user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_owned()))?;

        if !user.has_admin_access() {
            return Err(ApiError::forbidden());
        }

        let owned_shops: Vec<i32> = shop::Entity::find()
            .select_only()
            .column(shop::Column::Id)
            .filter(shop::Column::OwnerId.eq(user.id))
            .into_tuple()
            .all(db)
            .await?;

        let employee = employee::Entity::find()
            .filter(employee::Column::UserId.eq(user.id))
            .one(db)
            .await?;

        let employee_permissions = match employee.as_ref().and_then(|e| e.role_id) {
            Some(role_id) => role_permission::Entity::find()
                .filter(role_permission::Column::RoleId.eq(role_id))
                .all(db)
                .await?
                .into_iter()
                .map(|grant| grant.permission)
                .collect(),
            None => HashSet::new(),
        };

        Ok(Actor {
            user,
            owned_shops,
            employee,
            employee_permissions,
        })
    }

    pub fn is_superuser(&self) -> bool {
        self.user.is_superuser
    }

    pub fn is_owner_of(&self, shop_id: i32) -> bool {
        self.is_superuser() || self.owned_shops.contains(&shop_id)
    }

    /// Owned shops plus the shop the actor works at.
    pub fn managed_shops(&self) -> Vec<i32> {
        let mut shops = self.owned_shops.clone();
        if let Some(employee) = &self.employee {
            if !shops.contains(&employee.shop_id) {
                shops.push(employee.shop_id);
            }
        }
        shops
    }

    pub fn can(&self, shop_id: i32, permission: Permission) -> bool {
        if self.is_owner_of(shop_id) {
            return true;
        }
        matches!(&self.employee, Some(employee) if employee.shop_id == shop_id)
            && self.employee_permissions.contains(&permission)
    }

    /// Shops where the actor holds `permission`.
    pub fn scope(&self, permission: Permission) -> Result<Scope, ApiError> {
        if self.is_superuser() {
            return Ok(Scope::All);
        }
        let shops: Vec<i32> = self
            .managed_shops()
            .into_iter()
            .filter(|shop_id| self.can(*shop_id, permission))
            .collect();
        if shops.is_empty() {
            return Err(ApiError::forbidden());
        }
        Ok(Scope::Shops(shops))
    }

    /// Shops the actor can see at all, regardless of permissions.
    pub fn visible_shops(&self) -> Scope {
        if self.is_superuser() {
            Scope::All
        } else {
            Scope::Shops(self.managed_shops())
        }
    }

    pub fn require(&self, shop_id: Option<i32>, permission: Permission) -> Result<(), ApiError> {
        match shop_id {
            _ if self.is_superuser() => Ok(()),
            Some(shop_id) if self.can(shop_id, permission) => Ok(()),
            _ => Err(ApiError::forbidden()),
        }
    }

    pub fn require_superuser(&self) -> Result<(), ApiError> {
        if self.is_superuser() {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }

    /// Shop that new rows of a non-superuser land in: the first managed
    /// shop where they hold `permission`.
    pub fn home_shop(&self, permission: Permission) -> Result<i32, ApiError> {
        self.managed_shops()
            .into_iter()
            .find(|shop_id| self.can(*shop_id, permission))
            .ok_or_else(ApiError::forbidden)
    }
}

/// Ids of products offered in any inventory of the scoped shops, or every
/// product created by them.
pub async fn scoped_product_ids<C: ConnectionTrait>(
    db: &C,
    scope: &Scope,
) -> Result<Option<Vec<i32>>, ApiError> {
    let Scope::Shops(shops) = scope else {
        return Ok(None);
    };

    let mut ids: Vec<i32> = shop_inventory::Entity::find()
        .select_only()
        .column(shop_inventory::Column::ProductId)
        .filter(shop_inventory::Column::ShopId.is_in(shops.clone()))
        .into_tuple()
        .all(db)
        .await?;

    let created: Vec<i32> = product::Entity::find()
        .select_only()
        .column(product::Column::Id)
        .filter(product::Column::CreatedByShopId.is_in(shops.clone()))
        .into_tuple()
        .all(db)
        .await?;

    ids.extend(created);
    ids.sort_unstable();
    ids.dedup();
    Ok(Some(ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn staff(is_superuser: bool) -> user::Model {
        user::Model {
            id: 10,
            username: "staff".to_owned(),
            email: String::new(),
            password: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff: true,
            is_superuser,
            date_joined: Utc::now(),
        }
    }

    fn employee_of(shop_id: i32) -> employee::Model {
        employee::Model {
            id: 1,
            user_id: 10,
            shop_id,
            role_id: Some(1),
            position: "Clerk".to_owned(),
            phone: None,
            date_joined: Utc::now().date_naive(),
        }
    }

    #[test]
    fn owner_holds_every_permission_in_owned_shops() {
        let actor = Actor {
            user: staff(false),
            owned_shops: vec![1],
            employee: None,
            employee_permissions: HashSet::new(),
        };
        assert!(actor.can(1, Permission::ViewSales));
        assert!(!actor.can(2, Permission::ViewSales));
        assert_eq!(actor.scope(Permission::ManageOrders).unwrap(), Scope::Shops(vec![1]));
    }

    #[test]
    fn employee_is_limited_to_role_permissions() {
        let actor = Actor {
            user: staff(false),
            owned_shops: vec![],
            employee: Some(employee_of(2)),
            employee_permissions: [Permission::ManageProducts].into_iter().collect(),
        };
        assert!(actor.can(2, Permission::ManageProducts));
        assert!(!actor.can(2, Permission::ManageOrders));
        assert!(!actor.can(3, Permission::ManageProducts));
        assert!(actor.scope(Permission::ManageOrders).is_err());
        assert_eq!(actor.home_shop(Permission::ManageProducts).unwrap(), 2);
        assert!(actor.require(Some(3), Permission::ManageProducts).is_err());
    }

    #[test]
    fn superuser_sees_everything() {
        let actor = Actor {
            user: staff(true),
            owned_shops: vec![],
            employee: None,
            employee_permissions: HashSet::new(),
        };
        assert_eq!(actor.scope(Permission::ManageInventory).unwrap(), Scope::All);
        assert!(actor.require(None, Permission::ManageProducts).is_ok());
        assert!(Scope::All.contains(None));
        assert!(!Scope::Shops(vec![1]).contains(None));
    }
}
