//! API request and response types

use crate::models::{NoticeStatus, Role, SnsLoginType, YesNo};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Response envelope returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> CommonResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl CommonResponse<()> {
    /// Success without a payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: u64, page: u32, per_page: u32) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page as u64) as u32
        };
        Self {
            data,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

/// Author fields embedded in feeds, posts and comments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorSummary {
    pub user_hash: Option<String>,
    pub nickname: Option<String>,
    pub profile_image: Option<String>,
}

// ============================================================================
// Auth Types
// ============================================================================

/// Authentication tokens response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Kakao / Naver login: the provider access token obtained by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialTokenRequest {
    pub access_token: String,
}

/// Google login: the ID token obtained by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

/// The `data` part of the registration form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterData {
    pub sns_login_type: SnsLoginType,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub sns_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub marketing_agree: bool,
    #[serde(default)]
    pub push_agree: bool,
}

/// Successful login or registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub tokens: AuthTokens,
}

// ============================================================================
// User Types
// ============================================================================

/// Full account view, returned to the account owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_hash: String,
    pub sns_login_type: SnsLoginType,
    pub nickname: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_image: Option<String>,
    pub description: Option<String>,
    pub marketing_agree: bool,
    pub push_agree: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Account view with activity counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyInfoResponse {
    pub user: UserResponse,
    pub feed_count: i64,
    pub liked_feed_count: i64,
    pub community_count: i64,
}

/// Profile visible to other users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    pub user_hash: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub description: Option<String>,
    pub feed_count: i64,
}

/// Password change request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Block or unblock another user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenyUserRequest {
    pub deny_user_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenyToggleResponse {
    pub denied: bool,
}

/// A user on my block list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeniedUser {
    pub user_hash: String,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub denied_at: DateTime<Utc>,
}

/// Admin user search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListQuery {
    pub sns_id: Option<String>,
    pub name: Option<String>,
    pub nickname: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_limit() -> u32 {
    20
}

// ============================================================================
// Feed Types
// ============================================================================

/// Feed list ordering
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeedSort {
    #[default]
    CreatedAt,
    Likes,
    Views,
}

/// Feed list query parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub cursor: Option<i64>,
    pub title: Option<String>,
    pub nickname: Option<String>,
    pub target_user_hash: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub sort_by: FeedSort,
}

/// Feed as shown in lists and detail views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub is_public: YesNo,
    pub view_count: i32,
    pub like_count: i32,
    pub tags: Vec<String>,
    /// Stored (suffix-less) image paths, in display order
    pub images: Vec<String>,
    pub user: AuthorSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedLikeToggleResponse {
    pub feed_id: i64,
    pub like_count: i32,
    pub liked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikedFeedsQuery {
    #[serde(default = "default_liked_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_liked_limit() -> i64 {
    30
}

/// A feed on my liked list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikedFeed {
    pub feed_id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub liked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagSearchQuery {
    pub query: String,
}

// ============================================================================
// Comment Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub comment: String,
    #[serde(default)]
    pub parent_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCommentRequest {
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One comment with its replies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentNode {
    pub view_hash: String,
    pub parent_hash: Option<String>,
    pub comment: String,
    pub is_owner: bool,
    pub user: AuthorSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub children: Vec<CommentNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentTreeResponse {
    pub comments: Vec<CommentNode>,
}

// ============================================================================
// Community Types
// ============================================================================

/// Community list ordering
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommunitySort {
    #[default]
    Latest,
    Likes,
    Views,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityListQuery {
    pub category_code: Option<i32>,
    pub is_notice: Option<YesNo>,
    #[serde(default = "default_secret_filter")]
    pub is_secret: Option<YesNo>,
    pub keyword: Option<String>,
    pub user_nickname: Option<String>,
    /// `YYYY-MM`
    pub month: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub sort_by: CommunitySort,
    pub cursor: Option<i64>,
    pub my_only: Option<YesNo>,
    pub limit: Option<i64>,
}

impl Default for CommunityListQuery {
    fn default() -> Self {
        Self {
            category_code: None,
            is_notice: None,
            is_secret: default_secret_filter(),
            keyword: None,
            user_nickname: None,
            month: None,
            start_date: None,
            end_date: None,
            sort_by: CommunitySort::default(),
            cursor: None,
            my_only: None,
            limit: None,
        }
    }
}

fn default_secret_filter() -> Option<YesNo> {
    Some(YesNo::N)
}

/// One row of the community board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunitySummary {
    pub id: i64,
    pub view_hash: String,
    pub category_code: i32,
    pub title: String,
    pub contents: String,
    pub user_nickname: String,
    pub view_count: i32,
    pub like_count: i32,
    pub comment_count: i64,
    pub is_secret: YesNo,
    pub is_notice: YesNo,
    pub is_liked: YesNo,
    pub user_hash: Option<String>,
    pub profile_image: Option<String>,
    pub pinned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityListResponse {
    pub communities: Vec<CommunitySummary>,
    pub total_count: i64,
    /// Id of the last row; pass back as `cursor` for the next page
    pub cursor: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommunityRequest {
    pub title: String,
    pub contents: String,
    pub category_code: i32,
    #[serde(default = "default_no")]
    pub is_secret: YesNo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCommunityRequest {
    pub title: String,
    pub contents: String,
    #[serde(default = "default_no")]
    pub is_secret: YesNo,
}

fn default_no() -> YesNo {
    YesNo::N
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityDetail {
    pub view_hash: String,
    pub category_code: i32,
    pub title: String,
    pub contents: String,
    pub is_secret: YesNo,
    pub user_nickname: String,
    pub user: AuthorSummary,
    pub is_owner: bool,
    pub view_count: i32,
    pub like_count: i32,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityLikeResponse {
    pub like_count: i32,
    pub liked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityCommentQuery {
    pub limit: Option<i64>,
}

// ============================================================================
// Meal Calendar Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarQuery {
    /// `YYYY-MM`
    pub month: String,
    pub user_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealEntry {
    pub meal_hash: String,
    pub category_id: i64,
    pub category_name: Option<String>,
    pub title: String,
    pub contents: String,
    pub input_date: NaiveDate,
    pub month: String,
    pub is_pre_made: YesNo,
    pub is_public: YesNo,
    pub meal_condition: String,
    pub refer_feed_id: Option<i64>,
    pub image: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarResponse {
    pub month: String,
    /// Entries grouped by `YYYY-MM-DD`
    pub days: BTreeMap<String, Vec<MealEntry>>,
    pub month_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMealResponse {
    pub meal_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyCheckQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyCheckResponse {
    pub exist_categories: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthImageResponse {
    pub month: String,
    pub image: String,
}

// ============================================================================
// Notice Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeSummary {
    pub view_hash: String,
    pub category_id: i64,
    pub title: String,
    pub is_important: YesNo,
    pub status: NoticeStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeDetail {
    pub view_hash: String,
    pub category_id: i64,
    pub category_text: Option<String>,
    pub title: String,
    pub content: String,
    pub is_important: YesNo,
    pub status: NoticeStatus,
    pub admin_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveNoticeRequest {
    pub category_id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default)]
    pub status: Option<NoticeStatus>,
}

// ============================================================================
// Category & Food Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryQuery {
    #[serde(rename = "type")]
    pub category_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCode {
    pub id: i64,
    #[serde(rename = "type")]
    pub category_type: String,
    pub code: String,
    pub value: String,
    pub sort: i32,
    pub is_active: YesNo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveCategoryRequest {
    #[serde(rename = "type")]
    pub category_type: String,
    pub value: String,
    #[serde(default)]
    pub sort: Option<i32>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: i64,
    pub food_code: String,
    pub food_type: String,
    pub food_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodListQuery {
    pub food_type: Option<String>,
    pub food_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodSearchQuery {
    pub food_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFoodRequest {
    #[serde(default)]
    pub food_type: Option<String>,
    pub food_name: String,
}

// ============================================================================
// Dashboard Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_feeds: i64,
    pub total_communities: i64,
    pub last_feed_registered: String,
    pub last_user_registered: String,
    pub last_notice_registered: String,
}
