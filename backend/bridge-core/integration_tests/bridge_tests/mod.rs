mod bridge;
mod db;
mod helpers;
mod window;
