//! WebSocket Event Streaming
//!
//! Streams ledger events to connected clients.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Manages connections and subscriptions, relays events
//!   from the ledger's `BroadcastSink`
//! - **Handler**: Handles WebSocket upgrade and message processing
//! - **Messages**: Defines client and server message formats
//!
//! ## Topics
//!
//! - `records.created` - One event per appended record
//! - `alerts.low_inventory` - Stock fell below the ledger threshold
//! - `records.*`, `alerts.*` - Every topic in the family
//! - `*` - Everything
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8090/api/v1/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['alerts.low_inventory']}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'event') console.log(msg.topic, msg.event);
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, ConnectionId, HubConfig, HubError};
pub use messages::{ClientMessage, ServerMessage};
