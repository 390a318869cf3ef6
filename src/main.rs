fn main() -> std::process::ExitCode {
    lesson_player_lib::run()
}
