use std::str::FromStr;

use knowledge_share::models::{Person, Suggestion, Topic};

/// Everything the dashboard shows for the logged in person.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub me: Person,
    pub people: Vec<Person>,
    pub topics: Vec<Topic>,
    pub my_discussed: Vec<Topic>,
    pub suggestions: Vec<Suggestion>,
}

impl Dashboard {
    pub fn owns(&self, topic_id: i32) -> bool {
        self.topics
            .iter()
            .any(|t| t.id == topic_id && t.person_id == self.me.id)
    }

    pub fn add_topic(&mut self, topic: Topic) {
        self.me.topic_count += 1;
        self.topics.insert(0, topic);
    }

    pub fn remove_topic(&mut self, topic_id: i32) {
        let before = self.topics.len();
        self.topics.retain(|t| t.id != topic_id);
        if self.topics.len() < before {
            self.me.topic_count -= 1;
        }
    }

    pub fn edit_topic(&mut self, topic_id: i32, title: String, description: Option<String>) {
        if let Some(topic) = self.topics.iter_mut().find(|t| t.id == topic_id) {
            topic.title = title;
            topic.description = description;
        }
    }

    /// Moves a topic out of the active list once it has been presented.
    pub fn mark_discussed(&mut self, topic_id: i32) {
        let Some(index) = self.topics.iter().position(|t| t.id == topic_id) else {
            return;
        };
        let mut topic = self.topics.remove(index);
        topic.discussed = true;

        if topic.person_id == self.me.id {
            self.me.topic_count -= 1;
            self.me.discussed_count += 1;
            self.my_discussed.insert(0, topic);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    AddTopic,
    EditTopic(i32),
    DeleteTopic(i32),
    VoteTopic(i32),
    Suggest,
    VoteSuggestion(i32),
    Claim(i32),
    MarkDiscussed(i32),
    People,
    Leaderboard,
    Refresh,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let verb = input
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase();
        let id = || -> Result<i32, String> {
            input
                .split_whitespace()
                .nth(1)
                .ok_or_else(|| format!("'{verb}' needs an id"))?
                .parse()
                .map_err(|_| "id must be a number".to_string())
        };

        match verb.as_str() {
            "a" | "add" => Ok(Command::AddTopic),
            "e" | "edit" => Ok(Command::EditTopic(id()?)),
            "d" | "delete" => Ok(Command::DeleteTopic(id()?)),
            "v" | "vote" => Ok(Command::VoteTopic(id()?)),
            "s" | "suggest" => Ok(Command::Suggest),
            "u" | "upvote" => Ok(Command::VoteSuggestion(id()?)),
            "c" | "claim" => Ok(Command::Claim(id()?)),
            "m" | "done" => Ok(Command::MarkDiscussed(id()?)),
            "p" | "people" => Ok(Command::People),
            "l" | "leaderboard" => Ok(Command::Leaderboard),
            "r" | "refresh" => Ok(Command::Refresh),
            "q" | "quit" => Ok(Command::Quit),
            "" => Err("Type a command".to_string()),
            other => Err(format!("Unknown command '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn person(id: i32, name: &str) -> Person {
        Person {
            id,
            name: name.to_string(),
            last_login: None,
            topic_count: 0,
            discussed_count: 0,
            is_admin: false,
        }
    }

    fn topic(id: i32, owner: &Person) -> Topic {
        Topic {
            id,
            person_id: owner.id,
            person_name: owner.name.clone(),
            title: format!("topic {id}"),
            description: None,
            created_at: Utc::now(),
            discussed: false,
            vote_count: 0,
            voted_by_current_user: false,
        }
    }

    fn dashboard() -> Dashboard {
        let me = person(1, "Kris");
        Dashboard {
            me: me.clone(),
            people: vec![me],
            topics: Vec::new(),
            my_discussed: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    #[test]
    fn parses_commands() {
        assert_eq!("a".parse::<Command>(), Ok(Command::AddTopic));
        assert_eq!("V 12".parse::<Command>(), Ok(Command::VoteTopic(12)));
        assert_eq!("claim 3".parse::<Command>(), Ok(Command::Claim(3)));
        assert_eq!("  q ".parse::<Command>(), Ok(Command::Quit));
        assert!("v".parse::<Command>().is_err());
        assert!("v abc".parse::<Command>().is_err());
        assert!("x".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }

    #[test]
    fn local_topic_bookkeeping_tracks_counts() {
        let mut board = dashboard();
        let me = board.me.clone();
        let other = person(2, "Marta");
        board.add_topic(topic(10, &me));
        board.add_topic(topic(11, &me));
        board.topics.push(topic(20, &other));
        assert_eq!(board.me.topic_count, 2);
        assert!(board.owns(10));
        assert!(!board.owns(20));

        board.mark_discussed(10);
        assert_eq!(board.me.topic_count, 1);
        assert_eq!(board.me.discussed_count, 1);
        assert_eq!(board.my_discussed[0].id, 10);
        assert!(board.my_discussed[0].discussed);

        // someone else's topic leaves the list without touching my counts
        board.mark_discussed(20);
        assert_eq!(board.me.topic_count, 1);
        assert_eq!(board.topics.len(), 1);

        board.edit_topic(11, "renamed".into(), Some("why".into()));
        assert_eq!(board.topics[0].title, "renamed");

        board.remove_topic(11);
        board.remove_topic(11);
        assert_eq!(board.me.topic_count, 0);
        assert!(board.topics.is_empty());
    }
}
