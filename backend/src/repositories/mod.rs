//! Database repositories
//!
//! Provides data access layer for database operations.

pub mod categories;
pub mod comments;
pub mod communities;
pub mod dashboard;
pub mod denies;
pub mod feeds;
pub mod meals;
pub mod notices;
pub mod tags;
pub mod users;

pub use categories::{CategoryRecord, CategoryRepository, FoodRecord, FoodRepository};
pub use comments::{CommentRecord, CommentRepository, CommentTarget, NewComment};
pub use communities::{
    CommunityFilter, CommunityImageRecord, CommunityRecord, CommunityRepository, NewCommunity,
};
pub use dashboard::{DashboardRecord, DashboardRepository};
pub use denies::{DeniedUserRecord, DenyRepository};
pub use feeds::{FeedFilter, FeedImageRecord, FeedOwnership, FeedRecord, FeedRepository, LikedFeedRecord};
pub use meals::{MealRecord, MealRepository, NewMeal};
pub use notices::{NoticeFields, NoticeRecord, NoticeRepository};
pub use tags::{OwnedTag, TagRepository};
pub use users::{NewUser, UpdateProfile, UserCounts, UserFilter, UserRecord, UserRepository};
