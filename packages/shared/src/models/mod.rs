pub mod game;
pub mod move_record;
pub mod outcome;
pub mod profile;
pub mod team;
pub mod work_item;
