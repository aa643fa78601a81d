pub mod event_channel;
pub mod messages;
pub mod transport;

pub use event_channel::{EventChannel, HandlerId};
pub use messages::{
    AslTranslationPush, AudioChunkUpload, ChannelMessage, ProcessingUpdate, TextInput,
};
pub use transport::{ChannelError, NatsTransport, Transport};
