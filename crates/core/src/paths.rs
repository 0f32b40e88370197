//! Well-known page paths shared by the gateway and the client.

/// Login page. Receives the original destination as `callbackUrl`.
pub const LOGIN: &str = "/login";

/// Name of the query parameter carrying the post-login destination.
pub const CALLBACK_URL_PARAM: &str = "callbackUrl";

/// Shown when an authenticated user lacks the role for a page.
pub const UNAUTHORIZED: &str = "/unauthorized";

/// Neutral landing page.
pub const HOME: &str = "/";

/// Where admins land after login.
pub const ADMIN_LANDING: &str = "/admin/project";

/// Where everyone else lands after login.
pub const USER_LANDING: &str = "/user/project";

/// Admin ideas listing; accepts a `search` query parameter.
pub const IDEAS_LISTING: &str = "/admin/idea";

/// Admin statistics page; accepts a `search` query parameter.
pub const STATISTICS: &str = "/admin/statistics";

/// Full notification listing.
pub const NOTIFICATIONS_LISTING: &str = "/admin/notifications";

/// Name of the search query parameter on listing pages.
pub const SEARCH_PARAM: &str = "search";
