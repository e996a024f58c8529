//! Polymorphic handles: storing mixed concrete types behind one trait-object
//! handle type, with destruction still running the concrete destructors.

use managed_ptr::{SharedPtr, UniquePtr};

/// A trait for content that can be played as media.
trait MediaContent {
    /// Play the media content and return a playback message.
    fn play(&self) -> String;

    /// Get the title of the content.
    fn title(&self) -> &str;
}

struct Song {
    title: String,
    artist: String,
}

impl MediaContent for Song {
    fn play(&self) -> String {
        format!("Now playing: '{}' by {}", self.title, self.artist)
    }

    fn title(&self) -> &str {
        &self.title
    }
}

struct Podcast {
    title: String,
    episode: u32,
}

impl MediaContent for Podcast {
    fn play(&self) -> String {
        format!("Episode {} of '{}'", self.episode, self.title)
    }

    fn title(&self) -> &str {
        &self.title
    }
}

fn main() {
    println!("=== Trait Object Handles ===");

    // The safe route for exclusive handles: coerce the Box, then wrap.
    let mut playlist: Vec<UniquePtr<dyn MediaContent>> = Vec::new();
    playlist.push(UniquePtr::from(Box::new(Song {
        title: "Comfortably Numb".to_string(),
        artist: "Pink Floyd".to_string(),
    }) as Box<dyn MediaContent>));
    playlist.push(UniquePtr::from(Box::new(Podcast {
        title: "Rust in Production".to_string(),
        episode: 42,
    }) as Box<dyn MediaContent>));

    for item in &playlist {
        println!("{}", item.play());
    }

    // Shared handles can be upcast in place; the group identity is preserved and
    // the last owner still destroys through the concrete type.
    let concrete = SharedPtr::new(Song {
        title: "Echoes".to_string(),
        artist: "Pink Floyd".to_string(),
    });
    let keep = concrete.clone();

    // SAFETY: The callback is a pure unsizing coercion of its argument.
    let erased: SharedPtr<dyn MediaContent> =
        unsafe { concrete.cast_dyn_with_fn(|song| song as &dyn MediaContent) };

    println!("{}", erased.play());
    println!("same ownership group: {}", keep.owner_eq(&erased));
    println!("owners: {}", keep.use_count());
}
