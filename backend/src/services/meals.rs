//! Meal calendar service

use super::{check_uploads, dimension, discard_images, flag, store_images};
use crate::error::ApiError;
use crate::hashing;
use crate::media::{ImageKind, ImageStore, UploadedFile};
use crate::repositories::{
    CategoryRepository, MealRecord, MealRepository, NewMeal, TagRepository, UserRepository,
};
use bml_shared::models::YesNo;
use bml_shared::types::{
    CalendarResponse, CreateMealResponse, DailyCheckResponse, MealEntry, MonthImageResponse,
};
use bml_shared::validation::{
    month_of, parse_tags, validate_max_len, validate_month, validate_tags, MAX_TITLE_LEN,
};
use chrono::NaiveDate;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Fields of a new calendar entry
#[derive(Debug, Clone)]
pub struct MealForm {
    pub category_id: i64,
    pub input_date: NaiveDate,
    pub title: String,
    pub contents: String,
    pub is_pre_made: YesNo,
    pub is_public: YesNo,
    pub meal_condition: String,
    pub refer_feed_id: Option<i64>,
    pub tags: Option<String>,
}

const MAX_MEAL_CONDITION_LEN: usize = 20;

impl MealForm {
    /// Length checks; returns the parsed tags
    fn validate(&self) -> Result<Vec<String>, ApiError> {
        validate_max_len("title", &self.title, MAX_TITLE_LEN).map_err(ApiError::Validation)?;
        validate_max_len("meal_condition", &self.meal_condition, MAX_MEAL_CONDITION_LEN)
            .map_err(ApiError::Validation)?;
        let tags = self.tags.as_deref().map(parse_tags).unwrap_or_default();
        validate_tags(&tags).map_err(ApiError::Validation)?;
        Ok(tags)
    }
}

/// Group entries by `YYYY-MM-DD`, keeping their order within a day
fn group_by_day(entries: Vec<MealEntry>) -> BTreeMap<String, Vec<MealEntry>> {
    let mut days: BTreeMap<String, Vec<MealEntry>> = BTreeMap::new();
    for entry in entries {
        days.entry(entry.input_date.format("%Y-%m-%d").to_string())
            .or_default()
            .push(entry);
    }
    days
}

fn to_entry(meal: MealRecord, tags: Vec<String>) -> MealEntry {
    MealEntry {
        is_pre_made: flag(&meal.is_pre_made),
        is_public: flag(&meal.is_public),
        meal_hash: meal.view_hash,
        category_id: meal.category_id,
        category_name: meal.category_name,
        title: meal.title,
        contents: meal.contents,
        input_date: meal.input_date,
        month: meal.month,
        meal_condition: meal.meal_condition,
        refer_feed_id: meal.refer_feed_id,
        image: meal.image_path,
        tags,
    }
}

pub struct MealService;

impl MealService {
    /// Calendar of the viewer, or the public entries of another user
    pub async fn calendar(
        pool: &PgPool,
        viewer_id: i64,
        month: &str,
        user_hash: Option<&str>,
    ) -> Result<CalendarResponse, ApiError> {
        validate_month(month).map_err(ApiError::Validation)?;

        let owner_id = match user_hash.map(str::trim).filter(|h| !h.is_empty()) {
            Some(hash) => {
                UserRepository::find_active_by_hash(pool, hash)
                    .await
                    .map_err(ApiError::from_repo)?
                    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?
                    .id
            }
            None => viewer_id,
        };
        let public_only = owner_id != viewer_id;

        let meals = MealRepository::list_month(pool, owner_id, month, public_only)
            .await
            .map_err(ApiError::from_repo)?;
        let ids: Vec<i64> = meals.iter().map(|m| m.id).collect();

        let mut tags: HashMap<i64, Vec<String>> = HashMap::new();
        for tag in TagRepository::for_meals(pool, &ids)
            .await
            .map_err(ApiError::from_repo)?
        {
            tags.entry(tag.owner_id).or_default().push(tag.name);
        }

        let entries = meals
            .into_iter()
            .map(|meal| {
                let meal_tags = tags.remove(&meal.id).unwrap_or_default();
                to_entry(meal, meal_tags)
            })
            .collect();
        let month_image = MealRepository::month_image(pool, owner_id, month)
            .await
            .map_err(ApiError::from_repo)?;

        Ok(CalendarResponse {
            month: month.to_string(),
            days: group_by_day(entries),
            month_image,
        })
    }

    pub async fn create(
        pool: &PgPool,
        store: &ImageStore,
        hash_secret: &str,
        user_id: i64,
        form: MealForm,
        image: Option<UploadedFile>,
    ) -> Result<CreateMealResponse, ApiError> {
        let tags = form.validate()?;
        CategoryRepository::find_active_by_id(pool, form.category_id)
            .await
            .map_err(ApiError::from_repo)?
            .ok_or_else(|| ApiError::NotFound("Meal category not found".to_string()))?;

        if MealRepository::slot_taken(pool, user_id, form.input_date, form.category_id)
            .await
            .map_err(ApiError::from_repo)?
        {
            return Err(ApiError::Conflict(
                "A meal is already recorded for this date and category".to_string(),
            ));
        }
        if let Some(file) = &image {
            check_uploads(store, std::slice::from_ref(file))?;
        }

        let meal_hash = hashing::meal_hash(user_id, form.input_date, form.category_id, hash_secret);
        let month = month_of(form.input_date);

        let mut tx = pool.begin().await?;
        let meal_id = MealRepository::create(
            &mut *tx,
            NewMeal {
                user_id,
                category_id: form.category_id,
                refer_feed_id: form.refer_feed_id,
                title: form.title.trim(),
                contents: form.contents.trim(),
                month: &month,
                input_date: form.input_date,
                is_pre_made: form.is_pre_made.as_str(),
                is_public: form.is_public.as_str(),
                meal_condition: form.meal_condition.trim(),
                view_hash: &meal_hash,
            },
        )
        .await
        .map_err(ApiError::from_repo)?;
        TagRepository::set_meal_tags(&mut *tx, meal_id, &tags)
            .await
            .map_err(ApiError::from_repo)?;
        tx.commit().await?;

        if let Some(file) = image {
            if let Some(stored) = store_images(store, ImageKind::Meals, meal_id, vec![file])
                .await
                .into_iter()
                .next()
            {
                MealRepository::set_image(pool, meal_id, &stored.path)
                    .await
                    .map_err(ApiError::from_repo)?;
            }
        }

        info!(meal_id, user_id, date = %form.input_date, "Meal recorded");
        Ok(CreateMealResponse { meal_hash })
    }

    /// Hard delete of an entry and its image files
    pub async fn delete(
        pool: &PgPool,
        store: &ImageStore,
        user_id: i64,
        meal_hash: &str,
    ) -> Result<(), ApiError> {
        let meal = MealRepository::find_by_hash(pool, meal_hash)
            .await
            .map_err(ApiError::from_repo)?
            .ok_or_else(|| ApiError::NotFound("Meal not found".to_string()))?;
        if meal.user_id != user_id {
            return Err(ApiError::Forbidden("Not the owner of this meal".to_string()));
        }

        MealRepository::delete(pool, meal.id)
            .await
            .map_err(ApiError::from_repo)?;
        if let Some(path) = meal.image_path {
            discard_images(store, &[path]).await;
        }
        Ok(())
    }

    pub async fn check_date(
        pool: &PgPool,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<DailyCheckResponse, ApiError> {
        let exist_categories = MealRepository::categories_on(pool, user_id, date)
            .await
            .map_err(ApiError::from_repo)?;
        Ok(DailyCheckResponse { exist_categories })
    }

    /// Set the picture of a calendar month, replacing the previous one
    pub async fn upload_month_image(
        pool: &PgPool,
        store: &ImageStore,
        user_id: i64,
        month: &str,
        image: UploadedFile,
    ) -> Result<MonthImageResponse, ApiError> {
        validate_month(month).map_err(ApiError::Validation)?;
        let stored = store
            .save(ImageKind::Calendars, user_id, &image.filename, image.bytes)
            .await?;

        let previous = MealRepository::upsert_month_image(
            pool,
            user_id,
            month,
            &stored.path,
            dimension(stored.width),
            dimension(stored.height),
        )
        .await
        .map_err(ApiError::from_repo)?;
        if let Some(old) = previous.filter(|old| *old != stored.path) {
            discard_images(store, &[old]).await;
        }

        Ok(MonthImageResponse {
            month: month.to_string(),
            image: stored.path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(date: &str, category_id: i64) -> MealEntry {
        let input_date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        MealEntry {
            meal_hash: format!("{}-{}", date, category_id),
            category_id,
            category_name: None,
            title: String::new(),
            contents: String::new(),
            input_date,
            month: month_of(input_date),
            is_pre_made: YesNo::N,
            is_public: YesNo::N,
            meal_condition: String::new(),
            refer_feed_id: None,
            image: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_group_by_day() {
        let days = group_by_day(vec![
            entry("2026-03-01", 4),
            entry("2026-03-01", 5),
            entry("2026-03-09", 4),
        ]);

        assert_eq!(days.len(), 2);
        let first: Vec<_> = days["2026-03-01"].iter().map(|e| e.category_id).collect();
        assert_eq!(first, vec![4, 5]);
        assert_eq!(days["2026-03-09"].len(), 1);
        assert_eq!(days.keys().next().map(String::as_str), Some("2026-03-01"));
    }

    #[test]
    fn test_to_entry_maps_flags() {
        let now = chrono::Utc::now();
        let entry = to_entry(
            MealRecord {
                id: 1,
                user_id: 2,
                category_id: 4,
                category_name: Some("Breakfast".to_string()),
                refer_feed_id: None,
                title: "Oatmeal".to_string(),
                contents: String::new(),
                month: "2026-03".to_string(),
                input_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                is_pre_made: "Y".to_string(),
                is_public: "N".to_string(),
                meal_condition: "good".to_string(),
                image_path: Some("/attaches/meals/01/1/x".to_string()),
                view_hash: "mh".to_string(),
                created_at: now,
            },
            vec!["oats".to_string()],
        );

        assert_eq!(entry.meal_hash, "mh");
        assert_eq!(entry.is_pre_made, YesNo::Y);
        assert_eq!(entry.is_public, YesNo::N);
        assert_eq!(entry.tags, vec!["oats"]);
        assert_eq!(entry.image.as_deref(), Some("/attaches/meals/01/1/x"));
    }

    fn form(title: &str, meal_condition: &str, tags: Option<&str>) -> MealForm {
        MealForm {
            category_id: 4,
            input_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            title: title.to_string(),
            contents: String::new(),
            is_pre_made: YesNo::N,
            is_public: YesNo::N,
            meal_condition: meal_condition.to_string(),
            refer_feed_id: None,
            tags: tags.map(str::to_string),
        }
    }

    #[test]
    fn test_form_validate_keeps_tag_order() {
        let tags = form("Oatmeal", "good", Some("#zucchini#apple#miso"))
            .validate()
            .unwrap();
        assert_eq!(tags, vec!["zucchini", "apple", "miso"]);
    }

    #[test]
    fn test_form_validate_rejects_long_fields() {
        let long_title = "t".repeat(MAX_TITLE_LEN + 1);
        assert!(matches!(
            form(&long_title, "", None).validate(),
            Err(ApiError::Validation(_))
        ));
        assert!(form("Oatmeal", &"c".repeat(21), None).validate().is_err());

        let long_tag = format!("#{}", "x".repeat(101));
        assert!(form("Oatmeal", "", Some(&long_tag)).validate().is_err());
    }
}
