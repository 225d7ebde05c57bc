pub mod gemini;
pub mod tavily;

pub use gemini::{GeminiClient, GenerateContentRequest, GenerateContentResponse};
pub use tavily::{SearchResponse, SearchResult, TavilyClient};
