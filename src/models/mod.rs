mod recommendation;
mod restaurant;
mod review;
mod user;

pub use recommendation::{BasedOn, RecommendationResult, RestaurantRef, ReviewSignal, UserSignals};
pub use restaurant::{
    NewRestaurant, Restaurant, RestaurantDetail, RestaurantFilter, RestaurantQuery, RestaurantSort,
    SearchResults,
};
pub use review::{NewReview, Review, ReviewPatch};
pub use user::{Dashboard, NewUser, User, UserProfile};
