//! Here is where we define relay-specific metrics that we need.
//! They are lazily loaded during runtime.

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_gauge, IntCounter, IntGauge};

lazy_static! {
    // The number of client streams currently attached
    pub static ref NUM_CLIENTS_CONNECTED: IntGauge =
        register_int_gauge!("num_clients_connected", "the number of clients connected").unwrap();

    // The number of messages written into a client's stream
    pub static ref NUM_MESSAGES_DELIVERED: IntCounter =
        register_int_counter!("num_messages_delivered", "the number of messages delivered").unwrap();

    // The number of messages that could not be delivered
    pub static ref NUM_MESSAGES_DROPPED: IntCounter =
        register_int_counter!("num_messages_dropped", "the number of messages dropped").unwrap();
}
