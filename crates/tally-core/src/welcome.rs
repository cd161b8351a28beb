//! Welcome messages for new chat members.

use rand::Rng;

/// Join templates. `{Username}`, `{PlayerCount}` and `{ServerName}` are
/// substituted per member.
pub const JOIN_MESSAGES: &[&str] = &[
    "{ServerName} has joined {Username}... Wait I got it backwards, dang it",
    "{Username} has arrived, let's see how long they last...",
    "{Username} just made the member count {PlayerCount}",
    "Good luck {Username}, you'll need it",
    "{PlayerCount} members now counting {Username}!",
    "{Username}? That's an interesting name...",
    "No way, could it be? Is it... oh wait, it's just {Username}",
    "{ServerName} has a brand new member. It's the one, the only, {Username}!",
    "{Username} just got kidnapped",
    "{Username} discovered the nether",
    "{Username} might just be the reason I quit",
    "{Username} joined {ServerName}, or did they?",
    "Hey {Username}, {ServerName} here. Your home security system is great! Or is it?",
    "Do we really need {Username}? Oh wait they're already here",
    "It's a bird, it's a plane, it's... it's {Username}!",
    "{ServerName} now has {Username} to worry about",
    "Welcome {Username}. Yes I got lazy with this message, don't judge me",
];

/// Substitute the member placeholders into a template.
pub fn format_message(template: &str, username: &str, member_count: u64, chat_name: &str) -> String {
    template
        .replace("{Username}", username)
        .replace("{PlayerCount}", &member_count.to_string())
        .replace("{ServerName}", chat_name)
}

/// Render a welcome line with a randomly chosen template.
pub fn render(username: &str, member_count: u64, chat_name: &str) -> String {
    let idx = rand::rng().random_range(0..JOIN_MESSAGES.len());
    format_message(JOIN_MESSAGES[idx], username, member_count, chat_name)
}
