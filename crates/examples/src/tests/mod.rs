mod focusgrid;
mod modelview;
mod shapes;
