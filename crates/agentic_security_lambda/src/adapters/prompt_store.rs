/// Raw prompt object as read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptObject {
    pub body: Vec<u8>,
    /// Object version, present when the bucket is versioned.
    pub version_id: Option<String>,
}

pub trait PromptStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<PromptObject, String>;
}
