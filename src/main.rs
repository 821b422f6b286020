fn main() {
    sky_squadron::game::run();
}
