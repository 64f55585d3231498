//! The crawl document and its parts
//!
//! Field names serialize in camelCase; absent optional image fields are
//! omitted rather than written as null.

use serde::{Deserialize, Serialize};

/// The crawled profile's header information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub handle: String,
    pub bio: String,
    pub profile_url: String,
}

impl Profile {
    /// The profile used when nothing could be read from the page
    pub fn fallback(username: &str, profile_url: &str) -> Self {
        Self {
            name: String::new(),
            handle: format!("@{}", username),
            bio: String::new(),
            profile_url: profile_url.to_string(),
        }
    }
}

/// An image attached to a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl ImageRef {
    /// An image known only by its URL
    pub fn unenriched(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            local_path: None,
            caption: None,
        }
    }
}

/// One feed item
///
/// `image_count` always equals `images.len()`; construct through
/// [`Post::new`] to keep it that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub text: String,
    pub images: Vec<ImageRef>,
    pub image_count: usize,
}

impl Post {
    pub fn new(text: impl Into<String>, images: Vec<ImageRef>) -> Self {
        Self {
            text: text.into(),
            image_count: images.len(),
            images,
        }
    }
}

/// Everything a crawl produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub profile: Profile,
    /// In order of first discovery
    pub posts: Vec<Post>,
}

impl Document {
    /// Total images across all posts
    pub fn image_count(&self) -> usize {
        self.posts.iter().map(|post| post.image_count).sum()
    }
}

/// Composes the final document from the profile and collected posts
pub fn assemble_document(profile: Profile, posts: Vec<Post>) -> Document {
    Document { profile, posts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fallback_profile() {
        let profile = Profile::fallback("someone", "https://x.com/someone");
        assert_eq!(profile.name, "");
        assert_eq!(profile.handle, "@someone");
        assert_eq!(profile.bio, "");
        assert_eq!(profile.profile_url, "https://x.com/someone");
    }

    #[test]
    fn test_post_image_count_matches_images() {
        let post = Post::new("hello", vec![ImageRef::unenriched("a"), ImageRef::unenriched("b")]);
        assert_eq!(post.image_count, 2);

        let post = Post::new("hello", vec![]);
        assert_eq!(post.image_count, 0);
    }

    #[test]
    fn test_assemble_preserves_order() {
        let posts = vec![Post::new("B", vec![]), Post::new("A", vec![])];
        let document = assemble_document(Profile::fallback("u", "https://x.com/u"), posts);

        let texts: Vec<_> = document.posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["B", "A"]);
    }

    #[test]
    fn test_serialized_shape() {
        let document = assemble_document(
            Profile {
                name: "Some One".to_string(),
                handle: "@someone".to_string(),
                bio: "hi".to_string(),
                profile_url: "https://x.com/someone".to_string(),
            },
            vec![Post::new(
                "hello",
                vec![
                    ImageRef {
                        url: "https://cdn/a.jpg".to_string(),
                        local_path: Some("images/someone_post0_img0.jpg".to_string()),
                        caption: Some("a cat".to_string()),
                    },
                    ImageRef::unenriched("https://cdn/b.jpg"),
                ],
            )],
        );

        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(
            value,
            json!({
                "profile": {
                    "name": "Some One",
                    "handle": "@someone",
                    "bio": "hi",
                    "profileUrl": "https://x.com/someone"
                },
                "posts": [{
                    "text": "hello",
                    "images": [
                        {
                            "url": "https://cdn/a.jpg",
                            "localPath": "images/someone_post0_img0.jpg",
                            "caption": "a cat"
                        },
                        { "url": "https://cdn/b.jpg" }
                    ],
                    "imageCount": 2
                }]
            })
        );
    }
}
