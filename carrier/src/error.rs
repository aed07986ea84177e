//! Define our error/result structs

quick_error! {
    #[derive(Debug)]
    /// Carrier's main error object.
    pub enum CError {
        Msg(str: String) {
            description(str)
            display("carrier: error: {}", str)
        }
        Disconnected(channel: String) {
            description("channel disconnected")
            display("carrier: channel disconnected: {}", channel)
        }
        Timeout(channel: String) {
            description("receive timed out")
            display("carrier: receive timed out: {}", channel)
        }
    }
}

pub type CResult<T> = Result<T, CError>;
