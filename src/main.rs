mod app;
mod mosaic;
mod render;

fn main() {
    app::start();
}
