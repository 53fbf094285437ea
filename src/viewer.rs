//! The slideshow viewer.
//!
//! A [`Viewer`] keeps the catalog's slides in a [`SlideStore`], tracks the
//! slide on screen and applies [`Command`]s one at a time. Front ends only
//! turn user input into commands and render [`Viewer::current`].

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, SlideError};
use crate::state::data::{Reactions, SlideId, SlideRecord};
use crate::state::library::SlideRepository;
use crate::state::lookup::{CachePolicy, SlideIndex};
use crate::state::store::{NodeRef, SlideStore};

/// A user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    First,
    Previous,
    Next,
    Last,
    /// Jump to a 1-based slide number, exactly as typed
    Jump(String),
    Add {
        image_path: String,
        description: String,
    },
    /// Overwrite the current slide
    Update {
        image_path: String,
        description: String,
    },
    /// Delete the current slide
    Delete,
    /// Reload every slide from the catalog
    Refresh,
    Like,
    Dislike,
    ResetReactions,
}

type ParseFn = fn(&str) -> Result<Command>;

/// Command names, their argument parser and a help line.
static DISPATCH: &[(&[&str], ParseFn, &str)] = &[
    (&["first", "f"], |_| Ok(Command::First), "show the first slide"),
    (&["previous", "prev", "p"], |_| Ok(Command::Previous), "show the previous slide"),
    (&["next", "n"], |_| Ok(Command::Next), "show the next slide"),
    (&["last", "l"], |_| Ok(Command::Last), "show the last slide"),
    (
        &["jump", "j", "goto"],
        |args| Ok(Command::Jump(args.to_string())),
        "jump <N>: show slide N (a bare number works too)",
    ),
    (
        &["add", "a"],
        |args| {
            let (image_path, description) = split_fields(args);
            Ok(Command::Add {
                image_path,
                description,
            })
        },
        "add <image_path> <description>: append a slide",
    ),
    (
        &["update", "u"],
        |args| {
            let (image_path, description) = split_fields(args);
            Ok(Command::Update {
                image_path,
                description,
            })
        },
        "update <image_path> <description>: overwrite the current slide",
    ),
    (&["delete", "rm"], |_| Ok(Command::Delete), "delete the current slide"),
    (&["refresh", "r"], |_| Ok(Command::Refresh), "reload slides from the catalog"),
    (&["like", "+"], |_| Ok(Command::Like), "like the current slide"),
    (&["dislike", "-"], |_| Ok(Command::Dislike), "dislike the current slide"),
    (&["reset"], |_| Ok(Command::ResetReactions), "reset all likes and dislikes"),
];

fn split_fields(args: &str) -> (String, String) {
    match args.split_once(char::is_whitespace) {
        Some((image_path, description)) => (image_path.to_string(), description.trim().to_string()),
        None => (args.to_string(), String::new()),
    }
}

impl Command {
    /// Parse one line of user input.
    pub fn parse(line: &str) -> Result<Command> {
        let line = line.trim();
        if !line.is_empty() && line.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Command::Jump(line.to_string()));
        }

        let (verb, args) = match line.split_once(char::is_whitespace) {
            Some((verb, args)) => (verb, args.trim()),
            None => (line, ""),
        };
        let verb = verb.to_ascii_lowercase();

        DISPATCH
            .iter()
            .find(|(names, _, _)| names.contains(&verb.as_str()))
            .map(|(_, parse, _)| parse(args))
            .unwrap_or_else(|| Err(SlideError::UnknownCommand(line.to_string())))
    }

    /// `(names, help)` for every command
    pub fn help() -> impl Iterator<Item = (&'static [&'static str], &'static str)> {
        DISPATCH.iter().map(|(names, _, help)| (*names, *help))
    }
}

/// What is on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideView<'a> {
    /// 1-based position
    pub position: usize,
    pub total: usize,
    pub id: Option<SlideId>,
    pub record: &'a SlideRecord,
    pub reactions: Reactions,
}

impl fmt::Display for SlideView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}]", self.position, self.total)?;
        if let Some(id) = self.id {
            write!(f, " #{id}")?;
        }
        writeln!(f, " {}", self.record.image_path)?;
        writeln!(f, "{}", self.record.description)?;
        write!(
            f,
            "👍 {}  👎 {}",
            self.reactions.likes, self.reactions.dislikes
        )
    }
}

/// Slideshow state driven by [`Command`]s
pub struct Viewer<R: SlideRepository> {
    repo: R,
    store: SlideStore,
    index: SlideIndex,
    ids: HashMap<NodeRef, SlideId>,
    reactions: HashMap<NodeRef, Reactions>,
    current: Option<NodeRef>,
    wrap_around: bool,
}

impl<R: SlideRepository> Viewer<R> {
    /// Load every slide from `repo` and show the first one.
    pub fn new(repo: R, cache_policy: CachePolicy, wrap_around: bool) -> Result<Self> {
        let mut viewer = Viewer {
            repo,
            store: SlideStore::new(),
            index: SlideIndex::with_policy(cache_policy),
            ids: HashMap::new(),
            reactions: HashMap::new(),
            current: None,
            wrap_around,
        };
        viewer.reload()?;
        Ok(viewer)
    }

    pub fn with_config(repo: R, config: &Config) -> Result<Self> {
        Self::new(repo, config.cache_policy, config.wrap_around)
    }

    pub fn store(&self) -> &SlideStore {
        &self.store
    }

    pub fn index(&self) -> &SlideIndex {
        &self.index
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Give the repository back, e.g. to close it.
    pub fn into_repository(self) -> R {
        self.repo
    }

    /// The slide on screen, if there is one
    pub fn current(&self) -> Option<SlideView<'_>> {
        let node = self.current?;
        let record = self.store.get(node)?;
        Some(SlideView {
            position: self.store.position_of(node)? + 1,
            total: self.store.len(),
            id: self.ids.get(&node).copied(),
            record,
            reactions: self.reactions.get(&node).copied().unwrap_or_default(),
        })
    }

    /// Rebuild the store from the catalog, staying at the same position
    /// when it still exists.
    pub fn reload(&mut self) -> Result<()> {
        let position = self.current.and_then(|node| self.store.position_of(node));
        let slides = self.repo.list_slides()?;

        // Reactions follow the slide id across the rebuild
        let mut reactions: HashMap<SlideId, Reactions> = self
            .reactions
            .drain()
            .filter_map(|(node, counts)| Some((*self.ids.get(&node)?, counts)))
            .collect();

        // Every old handle dies with the rebuild, whatever the cache policy
        self.store.clear();
        self.index.invalidate();
        self.ids.clear();
        for slide in slides {
            let node = self.store.append(slide.record);
            if let Some(counts) = reactions.remove(&slide.id) {
                self.reactions.insert(node, counts);
            }
            self.ids.insert(node, slide.id);
        }

        let last = self.store.len().checked_sub(1);
        self.current = match position.zip(last) {
            Some((position, last)) => self.resolve(position.min(last)),
            None => self.store.head(),
        };

        info!("Loaded {} slides", self.store.len());
        Ok(())
    }

    /// Apply one command. Errors leave the viewer unchanged.
    pub fn dispatch(&mut self, command: Command) -> Result<()> {
        debug!(?command, "dispatch");
        match command {
            Command::First => self.current = self.store.head(),
            Command::Last => self.current = self.store.tail(),
            Command::Next => {
                let next = self.current.and_then(|node| self.store.next(node));
                match next {
                    Some(node) => self.current = Some(node),
                    None if self.wrap_around => self.current = self.store.head(),
                    None => {}
                }
            }
            Command::Previous => {
                let prev = self.current.and_then(|node| self.store.prev(node));
                match prev {
                    Some(node) => self.current = Some(node),
                    None if self.wrap_around => self.current = self.store.tail(),
                    None => {}
                }
            }
            Command::Jump(input) => self.jump(&input)?,
            Command::Add {
                image_path,
                description,
            } => {
                let record = SlideRecord::from_fields(Some(&image_path), Some(&description))?;
                let id = self.repo.create_slide(&record)?;
                let node = self.store.append(record);
                self.ids.insert(node, id);
                self.current = Some(node);
            }
            Command::Update {
                image_path,
                description,
            } => {
                let record = SlideRecord::from_fields(Some(&image_path), Some(&description))?;
                let (node, id) = self.current_entry()?;
                self.repo.update_slide(id, &record)?;
                self.store.replace(node, record)?;
            }
            Command::Delete => {
                let (node, id) = self.current_entry()?;
                self.repo.delete_slide(id)?;
                let successor = self.store.next(node).or_else(|| self.store.prev(node));
                self.store.remove(node);
                self.ids.remove(&node);
                self.reactions.remove(&node);
                self.current = successor;
            }
            Command::Refresh => self.reload()?,
            Command::Like => {
                let (node, _) = self.current_entry()?;
                self.reactions.entry(node).or_default().likes += 1;
            }
            Command::Dislike => {
                let (node, _) = self.current_entry()?;
                self.reactions.entry(node).or_default().dislikes += 1;
            }
            Command::ResetReactions => self.reactions.clear(),
        }
        Ok(())
    }

    fn jump(&mut self, input: &str) -> Result<()> {
        let number: i64 = input
            .trim()
            .parse()
            .map_err(|_| SlideError::Parse(input.to_string()))?;

        let node = number
            .checked_sub(1)
            .and_then(|position| usize::try_from(position).ok())
            .and_then(|position| self.resolve(position))
            .ok_or_else(|| SlideError::NotFound(format!("slide {number}")))?;

        self.current = Some(node);
        Ok(())
    }

    /// Position lookup that only hands out nodes still in the store.
    fn resolve(&mut self, position: usize) -> Option<NodeRef> {
        let node = self.index.find_by_index(&self.store, position)?;
        if self.store.contains(node) {
            Some(node)
        } else {
            warn!(position, "position cache returned a removed slide");
            None
        }
    }

    fn current_entry(&self) -> Result<(NodeRef, SlideId)> {
        self.current
            .and_then(|node| Some((node, *self.ids.get(&node)?)))
            .ok_or_else(|| SlideError::NotFound("no slide selected".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::library::SlideLibrary;

    fn viewer_with(descriptions: &[&str], wrap_around: bool) -> Viewer<SlideLibrary> {
        let mut library = SlideLibrary::open_in_memory().unwrap();
        for d in descriptions {
            library
                .create_slide(&SlideRecord::new(format!("{d}.jpg"), *d))
                .unwrap();
        }
        Viewer::new(library, CachePolicy::Versioned, wrap_around).unwrap()
    }

    fn shown<R: SlideRepository>(viewer: &Viewer<R>) -> Option<String> {
        viewer.current().map(|v| v.record.description.clone())
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("next").unwrap(), Command::Next);
        assert_eq!(Command::parse("  P ").unwrap(), Command::Previous);
        assert_eq!(Command::parse("3").unwrap(), Command::Jump("3".into()));
        assert_eq!(Command::parse("j two").unwrap(), Command::Jump("two".into()));
        assert_eq!(
            Command::parse("add bled.jpg Lake Bled, Slovenia").unwrap(),
            Command::Add {
                image_path: "bled.jpg".into(),
                description: "Lake Bled, Slovenia".into(),
            }
        );
        assert!(matches!(
            Command::parse("dance"),
            Err(SlideError::UnknownCommand(_))
        ));
        assert!(Command::parse("").is_err());
        assert_eq!(Command::help().count(), DISPATCH.len());
    }

    #[test]
    fn test_navigation_stops_at_ends() {
        let mut viewer = viewer_with(&["A", "B", "C"], false);
        assert_eq!(shown(&viewer).as_deref(), Some("A"));

        viewer.dispatch(Command::Previous).unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("A"));

        viewer.dispatch(Command::Next).unwrap();
        viewer.dispatch(Command::Next).unwrap();
        viewer.dispatch(Command::Next).unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("C"));

        viewer.dispatch(Command::First).unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("A"));
        viewer.dispatch(Command::Last).unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("C"));
    }

    #[test]
    fn test_navigation_wraps_around() {
        let mut viewer = viewer_with(&["A", "B", "C"], true);
        viewer.dispatch(Command::Previous).unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("C"));
        viewer.dispatch(Command::Next).unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("A"));
    }

    #[test]
    fn test_jump() {
        let mut viewer = viewer_with(&["A", "B", "C"], false);

        viewer.dispatch(Command::Jump("3".into())).unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("C"));
        let view = viewer.current().unwrap();
        assert_eq!((view.position, view.total), (3, 3));

        let err = viewer.dispatch(Command::Jump("4".into())).unwrap_err();
        assert!(matches!(err, SlideError::NotFound(_)));
        let err = viewer.dispatch(Command::Jump("0".into())).unwrap_err();
        assert!(matches!(err, SlideError::NotFound(_)));
        let err = viewer.dispatch(Command::Jump("-2".into())).unwrap_err();
        assert!(matches!(err, SlideError::NotFound(_)));
        let err = viewer.dispatch(Command::Jump("x".into())).unwrap_err();
        assert!(matches!(err, SlideError::Parse(_)));

        // failed jumps leave the current slide alone
        assert_eq!(shown(&viewer).as_deref(), Some("C"));

        viewer.dispatch(Command::Jump("3".into())).unwrap();
        assert_eq!(viewer.index().stats().hits, 1);
    }

    #[test]
    fn test_add_update_delete() {
        let mut viewer = viewer_with(&["A", "B"], false);

        viewer
            .dispatch(Command::Add {
                image_path: "c.jpg".into(),
                description: "C".into(),
            })
            .unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("C"));
        assert_eq!(viewer.repository().list_slides().unwrap().len(), 3);

        viewer.dispatch(Command::Jump("2".into())).unwrap();
        viewer
            .dispatch(Command::Update {
                image_path: "b2.jpg".into(),
                description: "B2".into(),
            })
            .unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("B2"));
        let stored = viewer.repository().list_slides().unwrap();
        assert_eq!(stored[1].record, SlideRecord::new("b2.jpg", "B2"));

        viewer.dispatch(Command::Delete).unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("C"));
        assert_eq!(viewer.store().len(), 2);

        // the cached position 2 now belongs to another slide
        viewer.dispatch(Command::Jump("2".into())).unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("C"));

        viewer.dispatch(Command::Delete).unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("A"));
        viewer.dispatch(Command::Delete).unwrap();
        assert!(viewer.current().is_none());
        assert!(viewer.repository().list_slides().unwrap().is_empty());
    }

    #[test]
    fn test_validation_happens_before_catalog() {
        let mut viewer = viewer_with(&["A"], false);
        let err = viewer
            .dispatch(Command::Add {
                image_path: "x.jpg".into(),
                description: String::new(),
            })
            .unwrap_err();
        assert!(matches!(err, SlideError::Validation { field: "description" }));
        assert_eq!(viewer.repository().list_slides().unwrap().len(), 1);
        assert_eq!(viewer.store().len(), 1);
    }

    #[test]
    fn test_empty_show() {
        let mut viewer = viewer_with(&[], false);
        assert!(viewer.current().is_none());
        viewer.dispatch(Command::Next).unwrap();
        assert!(matches!(
            viewer.dispatch(Command::Delete),
            Err(SlideError::NotFound(_))
        ));
        assert!(matches!(
            viewer.dispatch(Command::Like),
            Err(SlideError::NotFound(_))
        ));
    }

    #[test]
    fn test_reactions() {
        let mut viewer = viewer_with(&["A", "B"], false);
        viewer.dispatch(Command::Like).unwrap();
        viewer.dispatch(Command::Like).unwrap();
        viewer.dispatch(Command::Dislike).unwrap();
        assert_eq!(
            viewer.current().unwrap().reactions,
            Reactions { likes: 2, dislikes: 1 }
        );

        viewer.dispatch(Command::Next).unwrap();
        assert_eq!(viewer.current().unwrap().reactions, Reactions::default());

        viewer.dispatch(Command::ResetReactions).unwrap();
        viewer.dispatch(Command::First).unwrap();
        assert_eq!(viewer.current().unwrap().reactions, Reactions::default());
    }

    #[test]
    fn test_refresh_keeps_position() {
        let mut viewer = viewer_with(&["A", "B", "C"], false);
        viewer.dispatch(Command::Jump("2".into())).unwrap();
        viewer.dispatch(Command::Refresh).unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("B"));
        assert_eq!(viewer.store().len(), 3);
    }

    #[test]
    fn test_persistent_refresh_keeps_position() {
        let mut library = SlideLibrary::open_in_memory().unwrap();
        for d in ["A", "B", "C"] {
            library
                .create_slide(&SlideRecord::new(format!("{d}.jpg"), d))
                .unwrap();
        }
        let mut viewer = Viewer::new(library, CachePolicy::Persistent, false).unwrap();

        viewer.dispatch(Command::Jump("2".into())).unwrap();
        viewer.dispatch(Command::Refresh).unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("B"));
        assert_eq!(viewer.store().len(), 3);

        viewer.dispatch(Command::Jump("2".into())).unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("B"));
        viewer.dispatch(Command::Jump("3".into())).unwrap();
        assert_eq!(shown(&viewer).as_deref(), Some("C"));
    }

    #[test]
    fn test_refresh_keeps_reactions() {
        let mut viewer = viewer_with(&["A", "B"], false);
        viewer.dispatch(Command::Next).unwrap();
        viewer.dispatch(Command::Like).unwrap();
        viewer.dispatch(Command::Dislike).unwrap();

        viewer.dispatch(Command::Refresh).unwrap();
        assert_eq!(
            viewer.current().unwrap().reactions,
            Reactions { likes: 1, dislikes: 1 }
        );
        viewer.dispatch(Command::First).unwrap();
        assert_eq!(viewer.current().unwrap().reactions, Reactions::default());
    }

    #[test]
    fn test_display() {
        let viewer = viewer_with(&["A"], false);
        let text = viewer.current().unwrap().to_string();
        assert!(text.starts_with("[1/1] #1 A.jpg"));
        assert!(text.contains("👍 0"));
    }
}
