//! Admin notifications: push channel, store, dropdown view and click routing.

pub mod channel;
pub mod dropdown;
pub mod routing;
pub mod store;
pub mod transport;

pub use channel::{ChannelState, DesktopNotifier, NoopNotifier, NotificationChannel};
pub use dropdown::{DROPDOWN_LIMIT, DropdownView, NotificationDropdown};
pub use store::{NotificationStore, StoreSnapshot};
pub use transport::{PushConnection, PushTransport, WebSocketConnection, WebSocketTransport};
