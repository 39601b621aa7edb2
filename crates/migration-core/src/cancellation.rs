//! A thin newtype over `tokio_util`'s cancellation primitive. Cancellation
//! is cooperative: in-flight async steps check it at their own await points.

#[derive(Clone, Debug, Default)]
pub struct CancellationToken(tokio_util::sync::CancellationToken);

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken(tokio_util::sync::CancellationToken::new())
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.0.cancelled().await
    }
}
