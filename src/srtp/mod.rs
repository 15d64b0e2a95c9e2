pub mod constants;
pub mod crypto_policy;
pub mod event;
pub mod event_sink;
pub mod handles;
pub mod key_limit;
pub mod key_material;
pub mod lifecycle;
mod pipeline;
pub mod replay_window;
mod rollover_counter;
pub mod sec_serv;
pub mod session;
pub mod session_keys;
pub mod srtp_error;
pub mod srtp_profile;
pub mod srtp_settings;
pub mod ssrc_selector;
pub mod stream_context;
pub mod stream_policy;
mod utils;
pub use crypto_policy::{AuthType, CipherType, CryptoPolicy, PacketKind};
pub use event::{EventRecord, SrtpEvent};
pub use event_sink::EventHandler;
pub use handles::{SessionId, StreamHandle};
pub use key_limit::KeyLimit;
pub use key_material::{KeyMaterial, append_salt_to_key};
pub use lifecycle::{deinit, init, is_initialized};
pub use sec_serv::SecurityServices;
pub use session::Session;
pub use srtp_error::SrtpError;
pub use srtp_profile::SrtpProfile;
pub use srtp_settings::SrtpSettings;
pub use ssrc_selector::SsrcSelector;
pub use stream_context::{StreamContext, StreamDirection};
pub use stream_policy::StreamPolicy;
