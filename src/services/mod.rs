// tabsync services
// Services provide supporting functionality around the sync core.

pub mod settings_engine;
