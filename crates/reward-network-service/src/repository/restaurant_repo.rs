//! 餐厅仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::RestaurantRepositoryTrait;
use crate::error::Result;
use crate::models::{BenefitAvailabilityPolicy, MonetaryAmount, Percentage, Restaurant};

#[derive(Debug, sqlx::FromRow)]
struct RestaurantRow {
    id: i64,
    merchant_number: String,
    name: String,
    benefit_percentage: Percentage,
    benefit_availability_policy: String,
    benefit_minimum_amount: Option<MonetaryAmount>,
}

impl TryFrom<RestaurantRow> for Restaurant {
    type Error = crate::error::RewardError;

    fn try_from(row: RestaurantRow) -> Result<Self> {
        let policy = BenefitAvailabilityPolicy::from_parts(
            &row.benefit_availability_policy,
            row.benefit_minimum_amount,
        )?;
        Ok(Restaurant {
            id: row.id,
            merchant_number: row.merchant_number,
            name: row.name,
            benefit_percentage: row.benefit_percentage,
            benefit_availability_policy: policy,
        })
    }
}

/// 餐厅仓储
pub struct RestaurantRepository {
    pool: PgPool,
}

impl RestaurantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 按商户号查找餐厅
    pub async fn find_by_merchant_number(&self, merchant_number: &str) -> Result<Option<Restaurant>> {
        let row = sqlx::query_as::<_, RestaurantRow>(
            r#"
            SELECT id, merchant_number, name, benefit_percentage,
                   benefit_availability_policy, benefit_minimum_amount
            FROM restaurants
            WHERE merchant_number = $1
            "#,
        )
        .bind(merchant_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Restaurant::try_from).transpose()
    }

    /// 新增餐厅，返回主键
    pub async fn create(&self, restaurant: &Restaurant) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO restaurants (merchant_number, name, benefit_percentage,
                                     benefit_availability_policy, benefit_minimum_amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&restaurant.merchant_number)
        .bind(&restaurant.name)
        .bind(restaurant.benefit_percentage)
        .bind(restaurant.benefit_availability_policy.code())
        .bind(restaurant.benefit_availability_policy.threshold())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}

#[async_trait]
impl RestaurantRepositoryTrait for RestaurantRepository {
    async fn find_by_merchant_number(&self, merchant_number: &str) -> Result<Option<Restaurant>> {
        self.find_by_merchant_number(merchant_number).await
    }
}
